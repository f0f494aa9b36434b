/// Writes an error and every `source()` below it to the `Formatter`,
/// one cause per line. Used by `Debug` impls so loglines carry the
/// full chain instead of just the top error.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{e}\n")?;

    let mut source = e.source();
    while let Some(cause) = source {
        write!(f, "Caused by:\n\t{cause}")?;
        source = cause.source();
    }

    Ok(())
}
