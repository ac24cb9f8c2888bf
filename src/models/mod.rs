pub mod forecast;
pub mod openai;
pub mod openweather;
pub mod pushover;
pub mod weatherapi;
