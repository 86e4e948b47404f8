pub mod abort;
pub mod amf0_command;
pub mod amf0_data;
pub mod set_chunk_size;
