pub mod goats;
