pub mod http_queue;
pub mod in_process;
