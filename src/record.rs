//! The record codec shared by the store and by nested record packers.
//!
//! Encoding walks the cached [`FieldSet`](crate::FieldSet) of the record type and
//! writes every field in order. Decoding walks the *bytes*: each entry is matched
//! by name against the current field set, so fields added or removed between
//! versions of a type are tolerated in both directions.

use crate::context::ArchiveContext;
use crate::descriptor::{Archivable, FieldValue};
use crate::error::{ArchiveError, Result};
use crate::format::{RecordReader, RecordWriter};

/// What a decode did to the target object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Decoded {
    /// Number of fields assigned from the bytes.
    pub(crate) applied: usize,
    /// Names present in the bytes but unknown to the target type, in byte order.
    pub(crate) unresolved: Vec<String>,
}

/// Appends the record encoding of `value` to `out`.
///
/// `label` names the record in errors (the record name at top level, the type name
/// for nested records).
pub(crate) fn encode_record<R: Archivable>(
    cx: &ArchiveContext,
    label: &str,
    value: &R,
    out: &mut RecordWriter,
) -> Result<()> {
    let fields = cx.fields_of::<R>().map_err(|e| e.within(label, None))?;
    out.put_len(fields.len())?;

    for field in fields.iter() {
        let name = field.name();
        let wrap = |e: ArchiveError| e.within(label, Some(name));

        let current = value
            .field_value(name)
            .ok_or_else(|| ArchiveError::access(R::TYPE_NAME, name, "declared field is not readable"))
            .map_err(wrap)?;

        out.put_str(name)?;
        match current {
            FieldValue::Null => out.put_bool(false)?,
            FieldValue::Present(v) => {
                let entry = cx.registry().require(field.declared()).map_err(wrap)?;
                out.put_bool(true)?;
                out.framed(|w| entry.packer().pack(v, w, cx)).map_err(wrap)?;
            }
        }
    }
    Ok(())
}

/// Reads one record from `input` into `target`.
///
/// Fields missing from the bytes, and fields written as absent, keep their current
/// value. Entries naming a field `R` does not declare are skipped and reported.
/// Bytes after the last entry are left for the caller to check.
pub(crate) fn decode_record<R: Archivable>(
    cx: &ArchiveContext,
    label: &str,
    input: &mut RecordReader<'_>,
    target: &mut R,
) -> Result<Decoded> {
    let fields = cx.fields_of::<R>().map_err(|e| e.within(label, None))?;
    let count = input.size().map_err(|e| e.within(label, None))?;
    let mut decoded = Decoded::default();

    for _ in 0..count {
        let name = input.string().map_err(|e| e.within(label, None))?;
        let wrap = |e: ArchiveError| e.within(label, Some(&name));
        let present = input.boolean().map_err(wrap)?;

        let Some(field) = fields.find(&name) else {
            if present {
                input.skip_frame().map_err(wrap)?;
            }
            tracing::warn!(
                record = label,
                record_type = R::TYPE_NAME,
                field = %name,
                "record holds a field the type does not declare; skipped"
            );
            decoded.unresolved.push(name);
            continue;
        };

        if !present {
            continue;
        }

        let entry = cx.registry().require(field.declared()).map_err(wrap)?;
        let mut frame = input.frame().map_err(wrap)?;
        let value = entry.packer().unpack(&mut frame, cx).map_err(wrap)?;
        frame.finish().map_err(wrap)?;
        target.set_field(field.name(), value).map_err(wrap)?;
        decoded.applied += 1;
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PackerRegistry;
    use crate::Archivable;

    #[derive(Archivable, Debug, Default, PartialEq)]
    struct Sign {
        #[archive]
        text: String,
        #[archive]
        lines: Option<u8>,
    }

    #[derive(Archivable, Debug, Default, PartialEq)]
    #[archive(name = "Sign")]
    struct SignV2 {
        #[archive]
        text: String,
        #[archive]
        glowing: bool,
    }

    fn context() -> Result<ArchiveContext> {
        Ok(ArchiveContext::new(PackerRegistry::primitives()?))
    }

    fn encode<R: Archivable>(cx: &ArchiveContext, value: &R) -> Result<Vec<u8>> {
        let mut out = RecordWriter::new();
        encode_record(cx, "sign", value, &mut out)?;
        Ok(out.into_bytes())
    }

    #[test]
    fn layout_matches_the_record_grammar() -> Result<()> {
        let cx = context()?;
        let sign = Sign {
            text: "hi".into(),
            lines: None,
        };
        let bytes = encode(&cx, &sign)?;

        let mut r = RecordReader::new(&bytes);
        assert_eq!(r.size()?, 2);
        assert_eq!(r.string()?, "text");
        assert!(r.boolean()?);
        let mut frame = r.frame()?;
        assert_eq!(frame.string()?, "hi");
        frame.finish()?;
        assert_eq!(r.string()?, "lines");
        assert!(!r.boolean()?);
        r.finish()
    }

    #[test]
    fn absent_values_leave_the_target_untouched() -> Result<()> {
        let cx = context()?;
        let bytes = encode(
            &cx,
            &Sign {
                text: "spawn".into(),
                lines: None,
            },
        )?;

        let mut target = Sign {
            text: String::new(),
            lines: Some(4),
        };
        let decoded = decode_record(&cx, "sign", &mut RecordReader::new(&bytes), &mut target)?;
        assert_eq!(decoded.applied, 1);
        assert_eq!(target.lines, Some(4));
        assert_eq!(target.text, "spawn");
        Ok(())
    }

    #[test]
    fn unknown_fields_are_skipped_and_reported() -> Result<()> {
        let cx = context()?;
        let bytes = encode(
            &cx,
            &Sign {
                text: "old".into(),
                lines: Some(3),
            },
        )?;

        let mut newer = SignV2 {
            text: String::new(),
            glowing: true,
        };
        let mut input = RecordReader::new(&bytes);
        let decoded = decode_record(&cx, "sign", &mut input, &mut newer)?;
        input.finish()?;

        assert_eq!(decoded.unresolved, ["lines"]);
        assert_eq!(newer.text, "old");
        assert!(newer.glowing);
        Ok(())
    }

    #[test]
    fn missing_packer_names_record_and_field() -> Result<()> {
        #[derive(Archivable, Default)]
        struct Bag {
            #[archive]
            items: Vec<String>,
        }

        let cx = context()?;
        let err = encode(
            &cx,
            &Bag {
                items: vec!["apple".into()],
            },
        )
        .err();
        assert!(matches!(
            &err,
            Some(ArchiveError::Record { record, field: Some(field), source })
                if record == "sign"
                    && field == "items"
                    && matches!(**source, ArchiveError::PackerNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn partially_consumed_frame_is_rejected() -> Result<()> {
        let cx = context()?;
        let mut w = RecordWriter::new();
        w.put_len(1)?;
        w.put_str("text")?;
        w.put_bool(true)?;
        w.framed(|f| {
            f.put_str("hi")?;
            f.put_bool(true)
        })?;
        let bytes = w.into_bytes();

        let mut target = Sign::default();
        let err = decode_record(&cx, "sign", &mut RecordReader::new(&bytes), &mut target).err();
        assert!(matches!(
            err.as_ref().map(ArchiveError::root_cause),
            Some(ArchiveError::Format(_))
        ));
        Ok(())
    }
}
