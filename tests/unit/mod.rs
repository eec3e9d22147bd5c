/// Unit tests for the public domain API
mod classifier_tests;
mod domain_tests;
