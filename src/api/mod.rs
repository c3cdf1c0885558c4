//! HTTP admin API for managing records and cache entries.
//!
//! The API performs no authentication. It may only be bound to a loopback or private address
//! (see [`Config::api_bind_addr`][crate::config::Config::api_bind_addr]).
//!
//! # API Endpoints
//!
//! ## `/healthcheck` (GET)
//!
//!   Returns HTTP 200 (OK) and the JSON body `{"ok":"healthy"}` when the service is operational.
//!
//! ## `/records` (GET)
//!
//!   Returns every stored record as a JSON array of
//!   `{"domain": "...", "qtype": "...", "ttl": 300, "value": "..."}` objects.
//!
//! ## `/records` (POST)
//!
//!   Expects a JSON request body of the form:
//!
//!   ```json
//!   { "domain": "example.com", "qtype": "A", "ttl": 300, "value": "203.0.113.5" }
//!   ```
//!
//!   `ttl` is optional and defaults to 300 seconds. `qtype` must be one of `A`, `AAAA`, `CNAME`
//!   or `TXT`. Posting a record that already exists (same domain, type and value) updates its
//!   TTL. Returns HTTP 201 (Created) with the normalized record. If the pair is currently
//!   cached, the cache entry is rewritten from the store.
//!
//! ## `/records/{domain}/{qtype}` (PUT)
//!
//!   Expects `{ "ttl": 600 }` and sets the TTL of every record for the pair. Returns the updated
//!   records, or HTTP 404 (Not Found) if the pair has none.
//!
//! ## `/records/{domain}/{qtype}` (DELETE)
//!
//!   Deletes every record for the pair and evicts its cache entry. Returns `{"deleted": n}`.
//!   Hit counters are kept.
//!
//! ## `/cache/{domain}/{qtype}` (POST)
//!
//!   Copies the pair's records into the cache regardless of demand. Returns the cached records,
//!   or HTTP 404 (Not Found) if the pair has none.
//!
//! ## `/cache/{domain}/{qtype}` (DELETE)
//!
//!   Evicts the pair's cache entry. Returns `{"evicted": true}` if one was live.

mod api_error;
mod model;
mod routes;
pub mod server;

pub use server::new;
