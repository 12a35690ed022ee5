use ocrgate_core::TextSpan;

/// Spans whose top edges are closer than this share a line.
pub const SAME_LINE_TOLERANCE: u32 = 20;

/// Sort spans top-to-bottom, then left-to-right within a line.
///
/// A line starts at the highest unplaced span and takes every following span
/// whose top edge is within [`SAME_LINE_TOLERANCE`] of that first span.
pub fn reading_order(mut spans: Vec<TextSpan>) -> Vec<TextSpan> {
    spans.sort_by_key(|span| (span.bbox.y, span.bbox.x));

    let mut ordered = Vec::with_capacity(spans.len());
    let mut line: Vec<TextSpan> = Vec::new();
    for span in spans {
        if let Some(first) = line.first() {
            if span.bbox.y - first.bbox.y >= SAME_LINE_TOLERANCE {
                flush_line(&mut line, &mut ordered);
            }
        }
        line.push(span);
    }
    flush_line(&mut line, &mut ordered);
    ordered
}

fn flush_line(line: &mut Vec<TextSpan>, out: &mut Vec<TextSpan>) {
    line.sort_by_key(|span| span.bbox.x);
    out.append(line);
}
