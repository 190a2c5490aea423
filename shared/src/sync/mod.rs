pub mod packet_type;
pub mod replicate;
pub mod scheduler;
