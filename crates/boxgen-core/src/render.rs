//! Built-in renderer emitting C preprocessor fragments.
//!
//! Every fact becomes a macro invocation; the including build defines the
//! macros. Overlap checks live in the definition of `BOXGEN_MMIO_REGION_PAIR`,
//! not here.

use crate::emit::{CommonContext, EmitError, PartitionContext, Renderer};
use crate::regions::PooledRegion;
use boxgen_schema::MmioRegion;
use std::fmt::Write as _;

const HEADER: &str = "/* Generated by boxgen. Do not edit. */";

#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeRenderer;

impl Renderer for IncludeRenderer {
    fn render_common(&self, ctx: &CommonContext<'_>) -> Result<String, EmitError> {
        let mut out = String::new();
        writeln!(out, "{HEADER}")?;
        writeln!(
            out,
            "/* MMIO region pairs across {} partition(s). */",
            ctx.partition_count
        )?;
        writeln!(out)?;
        writeln!(
            out,
            "#define BOXGEN_MMIO_REGION_PAIR_COUNT {}",
            ctx.region_pairs.len()
        )?;
        for pair in &ctx.region_pairs {
            writeln!(out)?;
            writeln!(
                out,
                "/* {} x {} */",
                region_label(&pair.first),
                region_label(&pair.second)
            )?;
            writeln!(
                out,
                "BOXGEN_MMIO_REGION_PAIR({}, {})",
                region_macro(pair.first.region),
                region_macro(pair.second.region)
            )?;
        }
        Ok(out)
    }

    fn render_main(&self, ctx: &PartitionContext<'_>) -> Result<String, EmitError> {
        let p = ctx.partition;
        let mut out = String::new();
        write_preamble(&mut out, ctx)?;
        writeln!(out, "BOXGEN_MAIN_BOX_BEGIN({})", p.name)?;
        write_body(&mut out, ctx, "BOXGEN_MAIN_BOX")?;
        writeln!(out, "BOXGEN_MAIN_BOX_END({})", p.name)?;
        Ok(out)
    }

    fn render_partition(&self, ctx: &PartitionContext<'_>) -> Result<String, EmitError> {
        let p = ctx.partition;
        let mut out = String::new();
        write_preamble(&mut out, ctx)?;
        writeln!(out, "BOXGEN_BOX_BEGIN({})", p.name)?;
        writeln!(out, "BOXGEN_BOX_PRIORITY({})", p.priority)?;
        writeln!(out, "BOXGEN_BOX_ENTRY_POINT({})", p.entry_point)?;
        write_body(&mut out, ctx, "BOXGEN_BOX")?;
        writeln!(out, "BOXGEN_BOX_END({})", p.name)?;
        Ok(out)
    }
}

fn write_preamble(out: &mut String, ctx: &PartitionContext<'_>) -> Result<(), EmitError> {
    writeln!(out, "{HEADER}")?;
    writeln!(
        out,
        "/* Source manifest: {} */",
        ctx.partition.source_path.display()
    )?;
    writeln!(out)?;
    Ok(())
}

/// Lines shared by the main and regular box fragments; `prefix` picks the macro family.
fn write_body(out: &mut String, ctx: &PartitionContext<'_>, prefix: &str) -> Result<(), EmitError> {
    let p = ctx.partition;
    writeln!(out, "{prefix}_STACK_SIZE({:#x})", p.stack_size)?;
    writeln!(out, "{prefix}_HEAP_SIZE({:#x})", p.heap_size)?;
    writeln!(out, "{prefix}_CONTEXT({})", p.context_structure_name)?;
    for region in &p.mmio_regions {
        writeln!(out, "{prefix}_ACL({})", region_macro(region))?;
    }
    for irq in &p.irqs {
        writeln!(out, "{prefix}_IRQ({irq})")?;
    }
    for sfid in &p.sfids {
        writeln!(out, "{prefix}_SFID({})", c_string(sfid))?;
    }
    for sfid in &p.extern_sfids {
        writeln!(out, "{prefix}_EXTERN_SFID({})", c_string(sfid))?;
    }
    if let Some(status) = &p.spm_status {
        writeln!(out, "{prefix}_SPM_STATUS({status})")?;
    }
    if let Some(heap) = &p.global_heap {
        writeln!(
            out,
            "{prefix}_GLOBAL_HEAP({:#x}, {})",
            heap.page_size, heap.minimal_page_number
        )?;
    }
    Ok(())
}

fn region_macro(region: &MmioRegion) -> String {
    match region {
        MmioRegion::Named { base, permissions } => {
            format!("BOXGEN_MMIO_REGION_NAMED({base}, {permissions})")
        }
        MmioRegion::Numeric {
            base,
            size,
            permissions,
        } => format!("BOXGEN_MMIO_REGION_NUMERIC({base:#x}, {size:#x}, {permissions})"),
    }
}

fn region_label(region: &PooledRegion<'_>) -> String {
    format!("{}[{}]", region.partition, region.index)
}

/// Quote `value` as a C string literal. ASCII control characters without a
/// short escape become `\xNN`; the literal is split when a hex digit follows,
/// since C hex escapes take every hex digit that comes after them.
pub(crate) fn c_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => {
                out.push_str(&format!("\\x{:02x}", u32::from(c)));
                if chars.peek().is_some_and(char::is_ascii_hexdigit) {
                    out.push_str("\"\"");
                }
            }
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::emit::plan_emission;
    use crate::validate::ValidatedCollection;
    use boxgen_schema::{GlobalHeap, Partition, PartitionName, Sfid};
    use std::path::PathBuf;

    fn sample() -> ValidatedCollection {
        let main = Partition {
            source_path: PathBuf::from("box_main.xml"),
            name: PartitionName::new("main"),
            priority: "osPriorityNormal".to_owned(),
            entry_point: "main".to_owned(),
            stack_size: 0x800,
            heap_size: 0x1000,
            context_structure_name: "main_context".to_owned(),
            mmio_regions: vec![MmioRegion::Named {
                base: "UART0".to_owned(),
                permissions: "UVISOR_TACLDEF_PERIPH".to_owned(),
            }],
            sfids: Vec::new(),
            extern_sfids: vec![Sfid::new("led.blink")],
            src_files: Vec::new(),
            irqs: Vec::new(),
            spm_status: Some("enabled".to_owned()),
            global_heap: Some(GlobalHeap {
                page_size: 0x400,
                minimal_page_number: 4,
            }),
        };
        let led = Partition {
            source_path: PathBuf::from("box_led.xml"),
            name: PartitionName::new("box_led"),
            priority: "osPriorityAboveNormal".to_owned(),
            entry_point: "led_main".to_owned(),
            stack_size: 0x400,
            heap_size: 0x2000,
            context_structure_name: "box_context".to_owned(),
            mmio_regions: vec![MmioRegion::Numeric {
                base: 0x4000_2000,
                size: 0x100,
                permissions: "UVISOR_TACLDEF_PERIPH".to_owned(),
            }],
            sfids: vec![Sfid::new("led.blink")],
            extern_sfids: Vec::new(),
            src_files: Vec::new(),
            irqs: vec![17],
            spm_status: None,
            global_heap: None,
        };
        ValidatedCollection::new(vec![main, led]).unwrap()
    }

    #[test]
    fn common_lists_every_pair() {
        let collection = sample();
        let plan = plan_emission(&collection, &GeneratorConfig::default()).unwrap();
        let text = IncludeRenderer.render_common(&plan.common).unwrap();
        assert!(text.starts_with(HEADER));
        assert!(text.contains("#define BOXGEN_MMIO_REGION_PAIR_COUNT 1"));
        assert!(text.contains("/* main[0] x box_led[0] */"));
        assert!(text.contains(
            "BOXGEN_MMIO_REGION_PAIR(BOXGEN_MMIO_REGION_NAMED(UART0, UVISOR_TACLDEF_PERIPH), \
             BOXGEN_MMIO_REGION_NUMERIC(0x40002000, 0x100, UVISOR_TACLDEF_PERIPH))"
        ));
    }

    #[test]
    fn main_box_uses_main_macros_without_thread_fields() {
        let collection = sample();
        let plan = plan_emission(&collection, &GeneratorConfig::default()).unwrap();
        let text = IncludeRenderer.render_main(&plan.partitions[0]).unwrap();
        assert!(text.contains("BOXGEN_MAIN_BOX_BEGIN(main)"));
        assert!(text.contains("BOXGEN_MAIN_BOX_STACK_SIZE(0x800)"));
        assert!(text.contains("BOXGEN_MAIN_BOX_EXTERN_SFID(\"led.blink\")"));
        assert!(text.contains("BOXGEN_MAIN_BOX_SPM_STATUS(enabled)"));
        assert!(text.contains("BOXGEN_MAIN_BOX_GLOBAL_HEAP(0x400, 4)"));
        assert!(!text.contains("ENTRY_POINT"));
        assert!(text.trim_end().ends_with("BOXGEN_MAIN_BOX_END(main)"));
    }

    #[test]
    fn regular_box_declares_thread_and_acl() {
        let collection = sample();
        let plan = plan_emission(&collection, &GeneratorConfig::default()).unwrap();
        let text = IncludeRenderer.render_partition(&plan.partitions[1]).unwrap();
        assert!(text.contains("/* Source manifest: box_led.xml */"));
        assert!(text.contains("BOXGEN_BOX_PRIORITY(osPriorityAboveNormal)"));
        assert!(text.contains("BOXGEN_BOX_ENTRY_POINT(led_main)"));
        assert!(text.contains("BOXGEN_BOX_HEAP_SIZE(0x2000)"));
        assert!(text.contains(
            "BOXGEN_BOX_ACL(BOXGEN_MMIO_REGION_NUMERIC(0x40002000, 0x100, UVISOR_TACLDEF_PERIPH))"
        ));
        assert!(text.contains("BOXGEN_BOX_IRQ(17)"));
        assert!(text.contains("BOXGEN_BOX_SFID(\"led.blink\")"));
        assert!(!text.contains("GLOBAL_HEAP"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let collection = sample();
        let plan = plan_emission(&collection, &GeneratorConfig::default()).unwrap();
        assert_eq!(
            plan.render(&IncludeRenderer).unwrap(),
            plan.render(&IncludeRenderer).unwrap()
        );
    }

    #[test]
    fn c_string_escapes_quotes_and_backslashes() {
        assert_eq!(c_string(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[test]
    fn c_string_escapes_control_characters() {
        assert_eq!(c_string("a\tb\r"), r#""a\tb\r""#);
        assert_eq!(c_string("x\u{1}y"), r#""x\x01y""#);
        assert_eq!(c_string("\u{7f}"), r#""\x7f""#);
    }

    #[test]
    fn c_string_splits_literal_before_hex_digit() {
        assert_eq!(c_string("\u{1b}1"), r#""\x1b""1""#);
        assert_eq!(c_string("\u{1b}z"), r#""\x1bz""#);
    }

    #[test]
    fn c_string_keeps_non_ascii_text() {
        assert_eq!(c_string("svc.übung"), "\"svc.übung\"");
    }
}
