pub mod doctor;
pub mod seed;
