pub mod robust;
pub mod scanner;

pub use robust::Dispersion;
pub use scanner::RollingAnomalyScanner;
