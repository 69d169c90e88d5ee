mod result_table;
mod rpc_request;
mod server_command;
mod task_state;
