use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::labels::{BaseClass, Hec, LabelDefs};

pub fn load_builtin_v1() -> Result<LabelDefs> {
    let content = include_str!("../../assets/labels/kits21_v1.tsv");
    parse_label_tsv(content, "built-in kits21_v1")
}

pub fn load_label_tsv(path: &Path) -> Result<LabelDefs> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read label TSV {}", path.display()))?;
    parse_label_tsv(&content, &path.display().to_string())
}

pub fn parse_label_tsv(content: &str, source: &str) -> Result<LabelDefs> {
    let mut classes = Vec::new();
    let mut hecs = Vec::new();
    let mut order: Option<Vec<u8>> = None;

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = trimmed.split('\t').map(str::trim).collect();
        match parts.as_slice() {
            ["class", id, name] => {
                if name.is_empty() {
                    bail!("{}:{} empty class name", source, line_no);
                }
                let id = parse_id(id, source, line_no)?;
                classes.push(BaseClass {
                    id,
                    name: name.to_string(),
                });
            }
            ["hec", name, ids] => {
                if name.is_empty() {
                    bail!("{}:{} empty HEC name", source, line_no);
                }
                hecs.push(Hec {
                    name: name.to_string(),
                    labels: parse_id_list(ids, source, line_no)?,
                });
            }
            ["order", ids] => {
                if order.is_some() {
                    bail!("{}:{} construction order given twice", source, line_no);
                }
                order = Some(parse_id_list(ids, source, line_no)?);
            }
            _ => bail!(
                "{}:{} malformed TSV (expected class/hec/order row)",
                source,
                line_no
            ),
        }
    }

    let construction_order = match order {
        Some(order) => order,
        None => bail!("{}: missing construction order row", source),
    };

    Ok(LabelDefs {
        classes,
        hecs,
        construction_order,
    })
}

fn parse_id(raw: &str, source: &str, line_no: usize) -> Result<u8> {
    raw.trim()
        .parse::<u8>()
        .with_context(|| format!("{}:{} invalid label id '{}'", source, line_no, raw))
}

fn parse_id_list(raw: &str, source: &str, line_no: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        out.push(parse_id(part, source, line_no)?);
    }
    if out.is_empty() {
        bail!("{}:{} empty label list", source, line_no);
    }
    Ok(out)
}
