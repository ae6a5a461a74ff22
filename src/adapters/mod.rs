pub mod api;
pub mod db;
pub mod ocm_http;
