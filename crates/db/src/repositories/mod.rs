pub mod bus_repo;
pub mod grade_repo;
pub mod share_agreement_repo;

pub use bus_repo::BusRepo;
pub use grade_repo::GradeRepo;
pub use share_agreement_repo::ShareAgreementRepo;
