pub mod fetch; // Gated HTTP client for listing pages and report files
pub mod gate;
pub mod listing; // Listing page URLs + report-link scanner

pub use fetch::{FetchClient, HttpFetchClient};
pub use gate::FetchGate;
pub use listing::{listing_page_urls, ListingPageScanner, ScanOutcome, OIL_REPORT_MARKER};
