pub mod ask;
pub mod common;
pub mod doctor;
pub mod run;
