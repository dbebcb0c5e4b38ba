//! Geometrische Hilfsfunktionen für Orientierung und 3D-Kollisionserkennung.
//!
//! Dieses Modul stellt die sechs achsenparallelen Orientierungen eines
//! Quaders als feste Lookup-Tabelle bereit sowie die Überlappungstests,
//! die Platzierungssuche, Absenkung und Korrektur gemeinsam verwenden.
//! Alle Boxen sind hier über Mittelpunkt und volle Ausdehnung beschrieben.

use crate::model::Shape;
use crate::types::Vec3;

/// Die sechs Achsenpermutationen eines Quaders.
///
/// Jeder Eintrag indiziert in (Länge, Breite, Höhe) und liefert die
/// Ausdehnung entlang (X, Y, Z) des Laderaums. Index 0 ist die
/// Originalorientierung: Länge entlang X, Höhe vertikal, Breite entlang Z.
pub const ROTATIONS: [[usize; 3]; 6] = [
    [0, 2, 1], // Original
    [1, 2, 0], // 90° um Y gedreht
    [0, 1, 2], // 90° um X gedreht
    [2, 0, 1], // 90° um X, dann 90° um Z gedreht
    [1, 0, 2], // 90° um X, dann 90° um Y gedreht
    [2, 1, 0], // 90° um Z gedreht
];

/// Liefert die orientierte Ausdehnung eines Objekts.
///
/// Ungültige Indizes fallen auf die Originalorientierung zurück, damit die
/// Funktion für Render-Aufrufer totalsicher bleibt.
///
/// # Parameter
/// * `dims` - Originalmaße als (Länge, Breite, Höhe)
/// * `rotation` - Orientierungsindex 0-5
///
/// # Rückgabewert
/// Ausdehnung entlang (X, Y, Z) im Laderaum-Koordinatensystem
///
/// # Beispiel
/// ```
/// use pack_my_van::geometry::rotated_dims;
/// use pack_my_van::types::Vec3;
///
/// assert_eq!(rotated_dims((50.0, 40.0, 20.0), 0), Vec3::new(50.0, 20.0, 40.0));
/// assert_eq!(rotated_dims((50.0, 40.0, 20.0), 1), Vec3::new(40.0, 20.0, 50.0));
/// ```
pub fn rotated_dims(dims: (f64, f64, f64), rotation: usize) -> Vec3 {
    let source = [dims.0, dims.1, dims.2];
    let [x, y, z] = ROTATIONS.get(rotation).copied().unwrap_or(ROTATIONS[0]);
    Vec3::new(source[x], source[y], source[z])
}

/// Berechnet den formabhängigen Sicherheitsabstand für ein Objektpaar.
///
/// Zylinder und Kugeln werden als Bounding-Box gepackt, aber rund
/// gezeichnet; ohne Puffer würden sich die gerundeten Formen sichtbar
/// durchdringen, obwohl ihre Boxen knapp aneinander passen.
///
/// # Parameter
/// * `a`, `b` - Formen der beiden Objekte
/// * `cylinder_clearance` - horizontaler Puffer, sobald ein Zylinder beteiligt ist
/// * `sphere_clearance` - allseitiger Puffer, sobald eine Kugel beteiligt ist
///
/// # Rückgabewert
/// Zusätzlicher Abstand je Achse
pub fn clearance_for(a: Shape, b: Shape, cylinder_clearance: f64, sphere_clearance: f64) -> Vec3 {
    let mut buffer = Vec3::zero();

    if a == Shape::Cylinder || b == Shape::Cylinder {
        buffer.x += cylinder_clearance;
        buffer.z += cylinder_clearance;
    }

    if a == Shape::Sphere || b == Shape::Sphere {
        buffer.x += sphere_clearance;
        buffer.y += sphere_clearance;
        buffer.z += sphere_clearance;
    }

    buffer
}

/// Prüft, ob zwei mittelpunktbasierte Boxen sich überschneiden.
///
/// Überlappung liegt vor, wenn auf allen drei Achsen der Mittelpunktabstand
/// strikt kleiner ist als die halbe Summe der Ausdehnungen plus Puffer.
/// Exakter Flächenkontakt zählt damit nicht als Überlappung.
///
/// # Parameter
/// * `pos_a`, `dims_a` - Mittelpunkt und Ausdehnung der ersten Box
/// * `pos_b`, `dims_b` - Mittelpunkt und Ausdehnung der zweiten Box
/// * `buffer` - zusätzlicher Abstand je Achse (siehe `clearance_for`)
pub fn boxes_overlap(pos_a: Vec3, dims_a: Vec3, pos_b: Vec3, dims_b: Vec3, buffer: Vec3) -> bool {
    (pos_a.x - pos_b.x).abs() < (dims_a.x + dims_b.x) / 2.0 + buffer.x
        && (pos_a.y - pos_b.y).abs() < (dims_a.y + dims_b.y) / 2.0 + buffer.y
        && (pos_a.z - pos_b.z).abs() < (dims_a.z + dims_b.z) / 2.0 + buffer.z
}

/// Strenger Überlappungstest für die Korrekturphase.
///
/// Zieht die Sicherheitsmarge von den Schwellwerten ab, sodass beinahe
/// berührende Boxen als getrennt gelten. Das verhindert, dass die Korrektur
/// an Gleitkomma-Restfehlern oszilliert.
///
/// # Parameter
/// * `margin` - Toleranz, um die der Test enger ist als `boxes_overlap`
pub fn boxes_overlap_tight(
    pos_a: Vec3,
    dims_a: Vec3,
    pos_b: Vec3,
    dims_b: Vec3,
    margin: f64,
) -> bool {
    (pos_a.x - pos_b.x).abs() < (dims_a.x + dims_b.x) / 2.0 - margin
        && (pos_a.y - pos_b.y).abs() < (dims_a.y + dims_b.y) / 2.0 - margin
        && (pos_a.z - pos_b.z).abs() < (dims_a.z + dims_b.z) / 2.0 - margin
}

/// Berechnet die Eindringtiefe zweier Boxen je Achse.
///
/// Positive Komponenten bedeuten Überschneidung auf dieser Achse, negative
/// Abstand.
pub fn penetration_depths(pos_a: Vec3, dims_a: Vec3, pos_b: Vec3, dims_b: Vec3) -> Vec3 {
    Vec3::new(
        (dims_a.x + dims_b.x) / 2.0 - (pos_a.x - pos_b.x).abs(),
        (dims_a.y + dims_b.y) / 2.0 - (pos_a.y - pos_b.y).abs(),
        (dims_a.z + dims_b.z) / 2.0 - (pos_a.z - pos_b.z).abs(),
    )
}

/// Bestimmt die günstigste Trennachse zweier überlappender Boxen.
///
/// Gewählt wird die Achse mit der kleinsten positiven Eindringtiefe, also
/// die Richtung, in der die geringste Verschiebung die Objekte trennt.
///
/// # Rückgabewert
/// `Some((Achsenindex, Eindringtiefe))`, oder `None`, wenn auf keiner Achse
/// eine positive Eindringtiefe vorliegt
pub fn min_separation(
    pos_a: Vec3,
    dims_a: Vec3,
    pos_b: Vec3,
    dims_b: Vec3,
) -> Option<(usize, f64)> {
    let depths = penetration_depths(pos_a, dims_a, pos_b, dims_b);

    let mut best: Option<(usize, f64)> = None;
    for axis in 0..3 {
        let depth = depths[axis];
        if depth > 0.0 && best.is_none_or(|(_, current)| depth < current) {
            best = Some((axis, depth));
        }
    }
    best
}

/// Berechnet die Überlappung zweier Intervalle in einer Dimension.
///
/// Strikter Test: reines Aneinanderstoßen der Intervallgrenzen zählt nicht.
///
/// # Beispiel
/// ```
/// use pack_my_van::geometry::intervals_overlap;
///
/// assert!(intervals_overlap(0.0, 5.0, 3.0, 8.0));
/// assert!(!intervals_overlap(0.0, 5.0, 5.0, 8.0));
/// ```
pub fn intervals_overlap(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> bool {
    a_max > b_min && a_min < b_max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_table_covers_all_permutations() {
        let dims = (1.0, 2.0, 3.0);
        let mut seen: Vec<(f64, f64, f64)> =
            (0..6).map(|r| rotated_dims(dims, r).as_tuple()).collect();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        seen.dedup();

        // Bei drei paarweise verschiedenen Maßen müssen alle 6 Permutationen
        // verschieden sein.
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn rotation_zero_is_identity() {
        assert_eq!(
            rotated_dims((50.0, 40.0, 20.0), 0),
            Vec3::new(50.0, 20.0, 40.0)
        );
    }

    #[test]
    fn rotation_out_of_range_falls_back_to_identity() {
        assert_eq!(
            rotated_dims((1.0, 2.0, 3.0), 9),
            rotated_dims((1.0, 2.0, 3.0), 0)
        );
    }

    #[test]
    fn rotation_preserves_volume() {
        let dims = (3.0, 5.0, 7.0);
        for r in 0..6 {
            assert!((rotated_dims(dims, r).volume() - 105.0).abs() < 1e-9);
        }
    }

    #[test]
    fn overlap_is_strict_at_face_contact() {
        let dims = Vec3::new(10.0, 10.0, 10.0);
        let a = Vec3::zero();
        let touching = Vec3::new(10.0, 0.0, 0.0);
        let intruding = Vec3::new(9.5, 0.0, 0.0);

        assert!(!boxes_overlap(a, dims, touching, dims, Vec3::zero()));
        assert!(boxes_overlap(a, dims, intruding, dims, Vec3::zero()));
    }

    #[test]
    fn cylinder_buffer_inflates_horizontal_axes_only() {
        let buffer = clearance_for(Shape::Cylinder, Shape::Box, 1.0, 0.5);
        assert_eq!(buffer, Vec3::new(1.0, 0.0, 1.0));

        let dims = Vec3::new(10.0, 10.0, 10.0);
        let a = Vec3::zero();
        let flush = Vec3::new(10.0, 0.0, 0.0);
        // Bündig nebeneinander verletzt den Zylinderpuffer, gestapelt nicht.
        assert!(boxes_overlap(a, dims, flush, dims, buffer));
        let stacked = Vec3::new(0.0, 10.0, 0.0);
        assert!(!boxes_overlap(a, dims, stacked, dims, buffer));
    }

    #[test]
    fn sphere_buffer_inflates_all_axes() {
        let buffer = clearance_for(Shape::Box, Shape::Sphere, 1.0, 0.5);
        assert_eq!(buffer, Vec3::new(0.5, 0.5, 0.5));

        let both = clearance_for(Shape::Cylinder, Shape::Sphere, 1.0, 0.5);
        assert_eq!(both, Vec3::new(1.5, 0.5, 1.5));
    }

    #[test]
    fn tight_overlap_ignores_near_touching() {
        let dims = Vec3::new(10.0, 10.0, 10.0);
        let a = Vec3::zero();
        let near = Vec3::new(9.99, 0.0, 0.0);

        assert!(boxes_overlap(a, dims, near, dims, Vec3::zero()));
        assert!(!boxes_overlap_tight(a, dims, near, dims, 0.02));
    }

    #[test]
    fn min_separation_picks_cheapest_axis() {
        let dims = Vec3::new(10.0, 10.0, 10.0);
        let a = Vec3::zero();
        // Auf X um 1 eingedrungen, auf Y um 4, auf Z voll überlappt.
        let b = Vec3::new(9.0, 6.0, 0.0);

        let (axis, depth) = min_separation(a, dims, b, dims).expect("Boxen überlappen");
        assert_eq!(axis, 0);
        assert!((depth - 1.0).abs() < 1e-9);
    }

    #[test]
    fn min_separation_none_for_separated_boxes() {
        let dims = Vec3::new(10.0, 10.0, 10.0);
        assert!(min_separation(Vec3::zero(), dims, Vec3::new(20.0, 0.0, 0.0), dims).is_none());
    }
}
