mod config;
mod debounce;
mod error_body;
mod helpers;
mod interceptor;
mod session_guard;
mod storage;
