//! End-to-end tests of the recon service against mocked passive sources.

#[cfg(test)]
mod support;

#[cfg(test)]
mod scan;

#[cfg(test)]
mod monitor;
