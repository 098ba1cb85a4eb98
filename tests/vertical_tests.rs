//! Vertical layout tests — staff stacking, annotation room, and lyric
//! verse spacing, driven through the public model.

use pretty_assertions::assert_eq;

use alignlib::{
    layout_system, DurationClass, Event, FloatingMark, Layer, MarkAnchor, MarkKind, Measure,
    MeasureStaff, Place, StaffDef, Style, System,
};

/// A system of `staff_count` standard staves with one measure of plain
/// quarter notes, ready for per-staff adjustments.
fn plain_system(staff_count: i32) -> System {
    let mut system = System::new((1..=staff_count).map(StaffDef::standard).collect());
    system.measures.push(Measure {
        staves: (0..staff_count)
            .map(|_| MeasureStaff {
                layers: vec![Layer::from_events(vec![
                    Event::note(DurationClass::Quarter),
                    Event::note(DurationClass::Quarter),
                ])],
                ..MeasureStaff::empty()
            })
            .collect(),
    });
    system
}

/// Minimum gap below a standard full-size staff: the staff spacing plus the
/// staff's own height.
fn min_gap(style: &Style) -> i32 {
    style.spacing_staff * style.drawing_unit(100) + 4 * style.drawing_double_unit(100)
}

#[test]
fn staves_are_separated_by_the_minimum_gap() {
    let style = Style::default();
    let layout = layout_system(&plain_system(2), &style, None);

    let ys: Vec<i32> = layout.staves.iter().map(|s| s.y).collect();
    assert_eq!(ys, vec![0, -min_gap(&style)]);
    // the bottom margin adds one more gap below the last staff
    assert_eq!(layout.height, 2 * min_gap(&style));
}

#[test]
fn dynamic_above_the_first_staff_drops_it_from_the_system_top() {
    let style = Style::default();
    let mut system = plain_system(2);
    system.measures[0].staves[0].marks.push(FloatingMark {
        id: 1,
        kind: MarkKind::Dynamic,
        place: Place::Above,
        anchor: MarkAnchor::Event(0.0),
    });

    let layout = layout_system(&system, &style, None);

    let dynam = style.drawing_dynam_height(100);
    assert_eq!(layout.staves[0].y, -dynam);
    assert_eq!(layout.staves[1].y, -dynam - min_gap(&style));
}

#[test]
fn hairpin_defers_to_a_dynamic_on_the_same_side() {
    let style = Style::default();

    let mut both = plain_system(1);
    both.measures[0].staves[0].marks.extend([
        FloatingMark {
            id: 1,
            kind: MarkKind::Dynamic,
            place: Place::Above,
            anchor: MarkAnchor::Event(0.0),
        },
        FloatingMark {
            id: 2,
            kind: MarkKind::Hairpin,
            place: Place::Above,
            anchor: MarkAnchor::Event(1.0),
        },
    ]);
    let both_layout = layout_system(&both, &style, None);

    let mut hairpin_only = plain_system(1);
    hairpin_only.measures[0].staves[0].marks.push(FloatingMark {
        id: 2,
        kind: MarkKind::Hairpin,
        place: Place::Above,
        anchor: MarkAnchor::Event(1.0),
    });
    let hairpin_layout = layout_system(&hairpin_only, &style, None);

    assert_eq!(
        both_layout.staves[0].y,
        -style.drawing_dynam_height(100),
        "dynamic wins, heights are not summed"
    );
    assert_eq!(hairpin_layout.staves[0].y, -style.drawing_hairpin_height(100));
}

#[test]
fn annotation_room_stacks_on_top_of_content_overflow() {
    let style = Style::default();

    // content already pushes the second staff past the minimum gap; the
    // dynamic above it must come fully on top
    let mut system = plain_system(2);
    system.measures[0].staves[1].overflow_above = min_gap(&style) + 56;
    system.measures[0].staves[1].marks.push(FloatingMark {
        id: 1,
        kind: MarkKind::Dynamic,
        place: Place::Above,
        anchor: MarkAnchor::Event(0.0),
    });

    let layout = layout_system(&system, &style, None);

    let overflow = min_gap(&style) + 56;
    let dynam = style.drawing_dynam_height(100);
    assert_eq!(layout.staves[1].y - layout.staves[0].y, -(overflow + dynam));
}

#[test]
fn covered_annotation_room_costs_nothing() {
    let style = Style::default();

    // a small dynamic fits inside the minimum gap; the gap stays minimal
    let mut system = plain_system(2);
    system.measures[0].staves[1].marks.push(FloatingMark {
        id: 1,
        kind: MarkKind::Dynamic,
        place: Place::Above,
        anchor: MarkAnchor::Event(0.0),
    });

    let layout = layout_system(&system, &style, None);
    assert_eq!(layout.staves[1].y - layout.staves[0].y, -min_gap(&style));
}

#[test]
fn verse_counts_accumulate_across_measures() {
    let style = Style::default();
    let mut system = plain_system(2);
    // a second measure raises the verse count; the maximum wins
    let second = system.measures[0].clone();
    system.measures.push(second);
    system.measures[0].staves[0].verse_count = 1;
    system.measures[1].staves[0].verse_count = 3;
    // push the second staff past the minimum gap so the lyric room binds
    for measure in &mut system.measures {
        measure.staves[1].overflow_above = min_gap(&style);
    }

    let layout = layout_system(&system, &style, None);

    assert_eq!(layout.staves[0].verse_count, 3);
    let lyric_room =
        ((3.0 + 0.8) * style.lyric_line_space * style.drawing_unit(100) as f64) as i32;
    assert_eq!(
        layout.staves[1].y - layout.staves[0].y,
        -(min_gap(&style) + lyric_room)
    );
}

#[test]
fn marks_anchor_to_their_event_columns() {
    let style = Style::default();
    let mut system = plain_system(1);
    let second = system.measures[0].clone();
    system.measures.push(second);
    system.measures[1].staves[0].marks.push(FloatingMark {
        id: 7,
        kind: MarkKind::Dynamic,
        place: Place::Below,
        anchor: MarkAnchor::Event(1.0),
    });

    let layout = layout_system(&system, &style, None);

    let column_x = layout.measures[1]
        .columns
        .iter()
        .find(|c| (c.time - 1.0).abs() < 0.001)
        .expect("anchor column")
        .x;
    let mark = &layout.staves[0].marks[0];
    assert_eq!(mark.id, 7);
    assert_eq!(mark.x, layout.measures[1].x + column_x);
}

#[test]
fn smaller_staves_scale_their_annotation_room() {
    let style = Style::default();
    let mut system = plain_system(1);
    system.staves[0] = StaffDef { n: 1, lines: 5, size: 50 };
    system.measures[0].staves[0].marks.push(FloatingMark {
        id: 1,
        kind: MarkKind::Dynamic,
        place: Place::Above,
        anchor: MarkAnchor::Event(0.0),
    });

    let layout = layout_system(&system, &style, None);
    assert_eq!(layout.staves[0].y, -style.drawing_dynam_height(50));
}
