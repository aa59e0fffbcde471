pub mod error;
pub mod stats;
pub mod detector;
pub mod recurrent;
pub mod generator;
pub mod injector;
pub mod lsm;
pub mod traits;
pub mod report;
pub mod experiment;
pub mod config;
