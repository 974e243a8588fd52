//! PyO3 bindings for the host-side receiver

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

mod packet_bindings;
mod spectrum_bindings;

fn value_error<E: std::fmt::Display>(error: E) -> PyErr {
    PyValueError::new_err(error.to_string())
}

/// Python module definition
#[pymodule]
fn spectrum_link(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<spectrum_bindings::PyRealFft>()?;
    m.add_class::<packet_bindings::PyPacketDecoder>()?;
    m.add_function(wrap_pyfunction!(packet_bindings::encode_window, m)?)?;

    m.add("PACKET_END", crate::packet::PACKET_END)?;
    m.add("WINDOW_SIZE", crate::config::WINDOW_SIZE)?;

    Ok(())
}
