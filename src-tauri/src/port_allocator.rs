use std::net::TcpListener;

use crate::error::StartupError;

/// The listener is dropped immediately; the backend re-binds the port.
pub(crate) fn allocate_port() -> Result<u16, StartupError> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).map_err(StartupError::PortAllocation)?;
    let port = listener
        .local_addr()
        .map_err(StartupError::PortAllocation)?
        .port();
    drop(listener);
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::allocate_port;

    #[test]
    fn allocates_a_nonzero_ephemeral_port() {
        let port = allocate_port().expect("port available");
        assert!(port > 0);
    }

    #[test]
    fn consecutive_allocations_succeed() {
        let first = allocate_port().expect("first port");
        let second = allocate_port().expect("second port");
        assert!(first > 0 && second > 0);
    }
}
