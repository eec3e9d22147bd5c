/// Integration tests against real on-disk stores and the MCP server
mod migration_tests;
mod server_tests;
mod store_properties;
