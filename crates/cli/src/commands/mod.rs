pub mod ask;
pub mod clear;
pub mod run;
pub mod search;
pub mod set_persona;
pub mod status;
