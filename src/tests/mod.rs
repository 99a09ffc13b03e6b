
mod fetcher_tests;
mod resolver_tests;
mod symbols_tests;
