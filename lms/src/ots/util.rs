/// Returns an iterator over the w-bit Winternitz coefficients of the input bytes.
/// Implements the Coef function from section 3.1.3 of RFC8554
/// https://datatracker.ietf.org/doc/html/rfc8554#section-3.1.3
///
/// `w` must divide 8; every parameter set guarantees this.
pub(crate) fn coefs<'a>(
    bytes: impl IntoIterator<Item = &'a u8>,
    w: usize,
) -> impl Iterator<Item = u8> {
    let mask = ((1u16 << w) - 1) as u8;
    let entries_per_byte = 8 / w;
    bytes
        .into_iter()
        .copied()
        .flat_map(move |byte| (0..entries_per_byte).map(move |i| (byte >> (8 - w - i * w)) & mask))
}
