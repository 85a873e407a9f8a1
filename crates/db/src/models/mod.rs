pub mod bus;
pub mod grade;
pub mod share_agreement;
