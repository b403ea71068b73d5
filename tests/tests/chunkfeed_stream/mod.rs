mod http;
mod player;
