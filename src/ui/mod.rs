pub mod chart;
pub mod map;
pub mod mercator;
pub mod panels;
pub mod tiles;
