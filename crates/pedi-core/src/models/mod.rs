pub mod classification;
pub mod dose;
pub mod params;
pub mod result;
pub mod validation;
