//! Output formatting for query results

use crate::index::types::{DocId, ScoredDoc};
use crate::index::TermIndex;
use crate::query::QueryResult;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print a query result to stdout
pub fn print_result<I: TermIndex>(result: &QueryResult, index: &I, color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_result(&mut stdout, result, |doc_id| index.doc_name(doc_id))
}

/// Write unresolved terms, hits and a one-line summary
pub fn write_result<'n, W, F>(out: &mut W, result: &QueryResult, name_of: F) -> io::Result<()>
where
    W: WriteColor,
    F: Fn(DocId) -> Option<&'n str>,
{
    write_unresolved(out, &result.unresolved)?;
    write_hits(out, &result.hits, name_of)?;
    write_summary(out, result)
}

fn write_unresolved<W: WriteColor>(out: &mut W, unresolved: &[String]) -> io::Result<()> {
    for term in unresolved {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        write!(out, "not found")?;
        out.reset()?;
        writeln!(out, ": {}", term)?;
    }
    Ok(())
}

/// One line per hit: `<doc id>\t<score>\t<name>`
pub fn write_hits<'n, W, F>(out: &mut W, hits: &[ScoredDoc], name_of: F) -> io::Result<()>
where
    W: WriteColor,
    F: Fn(DocId) -> Option<&'n str>,
{
    for hit in hits {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(out, "{}", hit.doc_id)?;
        out.reset()?;
        write!(out, "\t{:.4}", hit.score)?;

        if let Some(name) = name_of(hit.doc_id) {
            write!(out, "\t")?;
            out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
            write!(out, "{}", name)?;
            out.reset()?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_summary<W: WriteColor>(out: &mut W, result: &QueryResult) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_bold(true))?;
    write!(
        out,
        "{} match{}",
        result.hits.len(),
        if result.hits.len() == 1 { "" } else { "es" }
    )?;
    out.reset()?;
    write!(
        out,
        " ({} iterations, {} jumps)",
        result.stats.iterations, result.stats.jumps
    )?;
    if result.truncated {
        write!(out, ", truncated")?;
    }
    writeln!(out)
}

/// Print a result as pretty JSON
pub fn write_json<W: Write>(out: &mut W, result: &QueryResult) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, result)?;
    writeln!(out)
}
