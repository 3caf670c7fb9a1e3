pub mod coordinator;
pub mod request;
pub mod scanner;
pub mod transport;


pub use coordinator::ScanCoordinator;
pub use request::{GtScanRequest, RawScan, prepare_raw_scans};
pub use scanner::RecordScanner;
pub use transport::{VisitRequest, VisitResponse, VisitTransport};
