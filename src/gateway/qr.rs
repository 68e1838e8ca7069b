//! Terminal QR rendering for pairing codes.
//!
//! Thin wrapper over qr2term with a typed error so callers can fall back to
//! printing the raw token when a code does not fit the symbol capacity.

use thiserror::Error;

/// Rendering failed; the caller should print the raw token instead.
#[derive(Debug, Error)]
#[error("failed to render QR code: {0}")]
pub struct RenderError(#[from] qr2term::QrError);

/// Render a pairing token as terminal QR art.
///
/// Deterministic: the same token always produces the same art. Fails when the
/// token exceeds the symbol capacity for the default error-correction level.
pub fn render(token: &str) -> Result<String, RenderError> {
    Ok(qr2term::generate_qr_string(token)?)
}

/// Print the labeled QR block for a pairing token.
pub fn print(token: &str) -> Result<(), RenderError> {
    let art = render(token)?;
    println!();
    println!("Scan this QR code with the messaging app on your phone:");
    println!("{}", art);
    Ok(())
}
