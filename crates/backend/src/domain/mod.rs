pub mod goat;
