// Loading of the purchase log
pub mod csv_parser;

pub use csv_parser::FragranceCsvParser;
