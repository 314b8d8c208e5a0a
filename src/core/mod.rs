pub mod backtest;
pub mod live;
pub mod portfolio;
pub mod risk;
pub mod slicer;
