pub mod dimse;
