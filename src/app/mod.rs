mod scanner;
mod shutdown;
mod startup;
mod types;


pub use scanner::Scanner;
pub use startup::ScannerBuilder;
pub use types::CameraBackend;
