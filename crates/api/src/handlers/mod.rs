pub mod accounts;
pub mod blobs;
pub mod content;
pub mod enhance;
pub mod planner;
pub mod upload;
