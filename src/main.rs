//! Command line front end over the abstract interface.
//!
//! Input columns for `call` are read from stdin as CSV, one row per line
//! (tab separated input is accepted too). Each Real/Integer input takes one
//! column; a Price input takes one column per component it requires, in open,
//! high, low, close, volume, open-interest order.

use std::error::Error;
use std::io::{self, Read};
use std::{env, process};

use csv::{ReaderBuilder, Trim};
use serde_json::json;
use ta_abstract::{InputData, OptValue, OutputBuffer, ParameterType, PriceData, TaLibrary};

fn usage(program: &str) -> ! {
    eprintln!("Usage:");
    eprintln!("  {program} groups");
    eprintln!("  {program} functions <group>");
    eprintln!("  {program} describe <function>");
    eprintln!("  {program} call <function> <start> <end> [param=value ...]  < columns");
    eprintln!("Backend: set TA_ABSTRACT_BACKEND=auto|reference|ta-lib");
    process::exit(1);
}

/// Reads comma separated (or tab separated, when the input holds no commas)
/// numeric columns. Lines starting with `#` are comments.
fn parse_columns(text: &str) -> Result<Vec<Vec<f64>>, Box<dyn Error>> {
    let delimiter = if !text.contains(',') && text.contains('\t') { b'\t' } else { b',' };
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .trim(Trim::All)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut columns: Vec<Vec<f64>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line());
        let row = record
            .iter()
            .map(|field| field.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("line {line}: {e}"))?;
        if columns.is_empty() {
            columns = vec![Vec::new(); row.len()];
        }
        if row.len() != columns.len() {
            return Err(format!("line {line}: expected {} columns, got {}", columns.len(), row.len()).into());
        }
        for (col, v) in columns.iter_mut().zip(row) {
            col.push(v);
        }
    }
    Ok(columns)
}

/// The column as integers, or `None` when any value is not integral.
fn integer_column(values: &[f64]) -> Option<Vec<i32>> {
    values
        .iter()
        .map(|&v| {
            if v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64 {
                Some(v as i32)
            } else {
                None
            }
        })
        .collect()
}

fn parse_override(arg: &str) -> Result<(String, OptValue), Box<dyn Error>> {
    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected param=value, got '{arg}'"))?;
    let value = match raw.parse::<i32>() {
        Ok(i) => OptValue::Integer(i),
        Err(_) => OptValue::Real(raw.parse::<f64>()?),
    };
    Ok((key.to_string(), value))
}

fn call(lib: &TaLibrary, args: &[String]) -> Result<(), Box<dyn Error>> {
    let descriptor = lib.resolve(&args[0].to_ascii_uppercase())?;
    let start: usize = args[1].parse()?;
    let end: usize = args[2].parse()?;
    let overrides = args[3..]
        .iter()
        .map(|a| parse_override(a))
        .collect::<Result<Vec<_>, _>>()?;

    let mut text = String::new();
    io::stdin().read_to_string(&mut text)?;
    let columns = parse_columns(&text)?;

    // Integer inputs need their own storage to borrow from.
    let integer_columns: Vec<Option<Vec<i32>>> = columns.iter().map(|c| integer_column(c)).collect();

    let mut next = 0usize;
    let mut take = |what: &str| -> Result<usize, Box<dyn Error>> {
        if next >= columns.len() {
            return Err(format!("{}: not enough input columns for {what}", descriptor.name).into());
        }
        next += 1;
        Ok(next - 1)
    };

    let mut inputs: Vec<InputData<'_>> = Vec::with_capacity(descriptor.nb_input());
    for desc in &descriptor.inputs {
        match desc.param_type {
            ParameterType::Real => inputs.push(InputData::Real(&columns[take(&desc.name)?])),
            ParameterType::Integer => {
                let col = take(&desc.name)?;
                let values = integer_columns[col]
                    .as_deref()
                    .ok_or_else(|| format!("{}: column {col} holds non-integral values", desc.name))?;
                inputs.push(InputData::Integer(values));
            }
            ParameterType::Price => {
                let mut price = PriceData::default();
                for (bit, label, _) in PriceData::default().components() {
                    if !desc.has_flag(bit) {
                        continue;
                    }
                    let series = Some(columns[take(label)?].as_slice());
                    match label {
                        "open" => price.open = series,
                        "high" => price.high = series,
                        "low" => price.low = series,
                        "close" => price.close = series,
                        "volume" => price.volume = series,
                        _ => price.open_interest = series,
                    }
                }
                inputs.push(InputData::Price(price));
            }
        }
    }

    let borrowed: Vec<(&str, OptValue)> = overrides.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    let result = lib.invoke(&descriptor, start, end, &inputs, &borrowed)?.into_trimmed();

    let outputs: Vec<_> = descriptor
        .outputs
        .iter()
        .zip(&result.outputs)
        .map(|(desc, out)| match out {
            OutputBuffer::Real(v) => json!({ "name": desc.name, "values": v }),
            OutputBuffer::Integer(v) => json!({ "name": desc.name, "values": v }),
        })
        .collect();
    let report = json!({
        "function": descriptor.name,
        "begin": result.begin,
        "count": result.count,
        "outputs": outputs,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run(lib: &TaLibrary, args: &[String]) -> Result<(), Box<dyn Error>> {
    match args[1].as_str() {
        "groups" => {
            for g in lib.function_groups()? {
                println!("{g}");
            }
        }
        "functions" => {
            for n in lib.functions_in_group(&args[2])? {
                println!("{n}");
            }
        }
        "describe" => {
            let descriptor = lib.resolve(&args[2].to_ascii_uppercase())?;
            println!("{}", serde_json::to_string_pretty(&*descriptor)?);
        }
        _ => call(lib, &args[2..])?,
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("ta-abstract");
    let well_formed = match args.get(1).map(String::as_str) {
        Some("groups") => args.len() == 2,
        Some("functions") | Some("describe") => args.len() == 3,
        Some("call") => args.len() >= 5,
        _ => false,
    };
    if !well_formed {
        usage(program);
    }

    let lib = TaLibrary::initialize()?;
    let outcome = run(&lib, &args);
    let closed = lib.finalize();
    outcome?;
    closed?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_columns_csv() {
        let text = "# open,close\n1.0, 2.5\n\n3,4\n";
        let cols = parse_columns(text).unwrap();
        assert_eq!(cols, vec![vec![1.0, 3.0], vec![2.5, 4.0]]);
    }

    #[test]
    fn test_parse_columns_tab_separated() {
        let cols = parse_columns("1\t2\n3\t4\n").unwrap();
        assert_eq!(cols, vec![vec![1.0, 3.0], vec![2.0, 4.0]]);
    }

    #[test]
    fn test_parse_columns_rejects_ragged_and_garbage() {
        let err = parse_columns("1,2\n3\n").unwrap_err();
        assert!(err.to_string().contains("expected 2 columns"), "{err}");
        assert!(parse_columns("1,abc\n").is_err());
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("timeperiod=12").unwrap(),
            ("timeperiod".to_string(), OptValue::Integer(12))
        );
        assert_eq!(
            parse_override("optInNbDev=1.5").unwrap(),
            ("optInNbDev".to_string(), OptValue::Real(1.5))
        );
        assert!(parse_override("timeperiod").is_err());
        assert!(parse_override("timeperiod=x").is_err());
    }

    #[test]
    fn test_integer_column_rejects_fractions() {
        assert_eq!(integer_column(&[1.0, -2.0]), Some(vec![1, -2]));
        assert_eq!(integer_column(&[1.0, 2.5]), None);
    }
}
