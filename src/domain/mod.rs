// Domain layer - Plain data shared by every other layer
pub mod chart;
pub mod credential;
pub mod dashboard;
pub mod keg;
