mod api_client;
mod export;
mod helpers;
