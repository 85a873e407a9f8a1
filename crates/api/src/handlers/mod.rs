pub mod grades;
pub mod sharing;
