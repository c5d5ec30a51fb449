use std::path::PathBuf;

use csv_core::WriteResult;

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum Format {
    Table,
    Jsonl,
    Csv,
}

#[derive(clap::Parser)]
#[group(id = "output::Args")]
pub struct Args {
    /// Write to this file instead of the terminal.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
    #[arg(long, short='f', value_enum, default_value_t = Format::Table)]
    format: Format,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not open the specified output file at {1:?}")]
    OpenOutputFile(#[source] std::io::Error, PathBuf),
    #[error("could not write data to the output file at {1:?}")]
    WriteFile(#[source] std::io::Error, PathBuf),
    #[error("could not write data to the terminal")]
    WriteStdout(#[source] std::io::Error),
    #[error("could not serialize a record to JSON")]
    SerializeJson(#[source] serde_json::Error),
}

/// A row of listing output.
///
/// Table and CSV output use [`Record::HEADERS`] and [`Record::cells`]; JSON lines output
/// serializes the record itself.
pub trait Record: serde::Serialize {
    const HEADERS: &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

impl Args {
    pub fn to_output<R: Record>(self) -> Result<Output<R>, Error> {
        let io = match &self.output {
            None => Box::new(std::io::stdout().lock()) as Box<_>,
            Some(path) => Box::new(
                std::fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
                    .map_err(|e| Error::OpenOutputFile(e, path.clone()))?,
            ) as Box<_>,
        };
        let formatter = match self.format {
            Format::Table => {
                let mut comfy = comfy_table::Table::new();
                comfy
                    .set_header(R::HEADERS.to_vec())
                    .set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
                Formatter::Table { comfy }
            }
            Format::Jsonl => Formatter::Jsonl,
            Format::Csv => Formatter::Csv,
        };
        let mut output = Output {
            path: self.output,
            io,
            formatter,
            _record: std::marker::PhantomData,
        };
        if let Formatter::Csv = output.formatter {
            output.write_csv_row(R::HEADERS)?;
        }
        Ok(output)
    }
}

pub struct Output<R> {
    path: Option<PathBuf>,
    io: Box<dyn std::io::Write>,
    formatter: Formatter,
    _record: std::marker::PhantomData<fn(R)>,
}

enum Formatter {
    Csv,
    Table { comfy: comfy_table::Table },
    Jsonl,
}

impl<R: Record> Output<R> {
    fn write_csv_row<V: std::ops::Deref<Target = str>>(
        &mut self,
        values: &[V],
    ) -> Result<(), Error> {
        // Worst case every byte is a quote that needs escaping, plus the surrounding quotes.
        let max_len = 2 + 2 * values.iter().map(|v| v.len()).max().unwrap_or(0);
        let mut buffer = vec![0; max_len];
        let mut writer = csv_core::Writer::new();
        for (i, value) in values.iter().enumerate() {
            if i != 0 {
                let (WriteResult::InputEmpty, ob) = writer.delimiter(&mut buffer) else {
                    unreachable!("delimiter always fits the buffer");
                };
                self.io.write_all(&buffer[..ob]).map_err(|e| self.write_error(e))?;
            }
            let (WriteResult::InputEmpty, _, ob) = writer.field(value.as_bytes(), &mut buffer)
            else {
                unreachable!("csv field buffer is sized for the worst case");
            };
            self.io.write_all(&buffer[..ob]).map_err(|e| self.write_error(e))?;
        }
        let (WriteResult::InputEmpty, ob) = writer.terminator(&mut buffer) else {
            unreachable!("terminator always fits the buffer");
        };
        self.io.write_all(&buffer[..ob]).map_err(|e| self.write_error(e))
    }

    pub fn record(&mut self, record: &R) -> Result<(), Error> {
        match &mut self.formatter {
            Formatter::Csv => {
                let cells = record.cells();
                self.write_csv_row(&cells)?;
            }
            Formatter::Table { comfy } => {
                comfy.add_row(record.cells());
            }
            Formatter::Jsonl => {
                serde_json::to_writer(&mut self.io, record).map_err(Error::SerializeJson)?;
                writeln!(self.io).map_err(|e| self.write_error(e))?
            }
        }
        Ok(())
    }

    fn write_error(&self, e: std::io::Error) -> Error {
        match &self.path {
            None => Error::WriteStdout(e),
            Some(p) => Error::WriteFile(e, p.clone()),
        }
    }

    pub fn commit(mut self) -> Result<(), Error> {
        if let Formatter::Table { comfy } = &self.formatter {
            writeln!(self.io, "{comfy}").map_err(|e| self.write_error(e))?;
        }
        self.io.flush().map_err(|e| self.write_error(e))
    }
}
