// Authentication helpers

pub mod jwt;
