pub mod award;
pub mod dashboard;
pub mod grading;
pub mod ranking;
pub mod reward;
