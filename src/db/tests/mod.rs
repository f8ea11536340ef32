mod migrations;
mod status;
