//! Freiraumverwaltung für die Platzierungssuche.
//!
//! Dieses Modul verfolgt die aktuell verfügbaren quaderförmigen Teilräume
//! des Laderaums. Nach jeder Platzierung wird der belegte Raum entnommen
//! und in bis zu drei Nachfolgeräume zerlegt; anschließend werden
//! benachbarte Räume mit identischem Querschnitt wieder verschmolzen, um
//! die Fragmentierung zu begrenzen.
//!
//! Die Räume dürfen sich konstruktionsbedingt gegenseitig überlappen: sie
//! sind eine Suchhilfe für Kandidatenpositionen, keine Partition des
//! Laderaums.

use crate::model::CargoHold;
use crate::types::Vec3;

/// Ein freier quaderförmiger Teilraum des Laderaums.
///
/// # Felder
/// * `position` - Minimal-Ecke im Laderaum-Koordinatensystem
/// * `size` - Ausdehnung je Achse (alle Komponenten positiv)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FreeSpace {
    pub position: Vec3,
    pub size: Vec3,
}

impl FreeSpace {
    /// Prüft, ob eine orientierte Objektausdehnung in diesen Raum passt.
    ///
    /// Der Vergleich ist exakt (`<=` ohne Toleranz): ein Objekt, das den
    /// Raum vollständig ausfüllt, passt gerade noch.
    #[inline]
    pub fn can_hold(&self, dims: Vec3) -> bool {
        dims.x <= self.size.x && dims.y <= self.size.y && dims.z <= self.size.z
    }
}

/// Verwaltet die Menge der freien Teilräume während eines Packlaufs.
#[derive(Clone, Debug)]
pub struct SpaceTracker {
    spaces: Vec<FreeSpace>,
    epsilon: f64,
}

impl SpaceTracker {
    /// Erstellt einen Tracker mit genau einem Raum über den ganzen Laderaum.
    ///
    /// Der Laderaum ist in X und Z auf den Ursprung zentriert, der Boden
    /// liegt bei `-Höhe/2`. X überspannt die Tiefe, Z die Breite.
    ///
    /// # Parameter
    /// * `hold` - Der Laderaum
    /// * `epsilon` - Toleranz für degenerierte Räume und Nachbarschaftstests
    pub fn seed(hold: &CargoHold, epsilon: f64) -> Self {
        let size = hold.frame_size();
        Self {
            spaces: vec![FreeSpace {
                position: size.half() * -1.0,
                size,
            }],
            epsilon,
        }
    }

    /// Liefert die aktuell verfolgten Räume in Einfügereihenfolge.
    pub fn spaces(&self) -> &[FreeSpace] {
        &self.spaces
    }

    /// Anzahl der verfolgten Räume.
    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    /// Gibt an, ob keine Räume mehr verfügbar sind.
    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    /// Entnimmt einen Raum nach einer Platzierung in seiner Minimal-Ecke.
    ///
    /// Der Raum wird entfernt und in bis zu drei Nachfolger zerlegt:
    /// der Rest entlang X neben dem Objekt, der Rest über dem Objekt und
    /// der Rest entlang Z dahinter. Nachfolger mit einer Komponente unter
    /// der Toleranz werden verworfen. Abschließend werden benachbarte Räume
    /// verschmolzen.
    ///
    /// # Parameter
    /// * `index` - Index des entnommenen Raums
    /// * `item_dims` - orientierte Ausdehnung des platzierten Objekts
    pub fn consume(&mut self, index: usize, item_dims: Vec3) {
        let space = self.spaces.remove(index);

        let successors = [
            // Rest entlang X, begrenzt auf den Querschnitt des Objekts
            FreeSpace {
                position: Vec3::new(
                    space.position.x + item_dims.x,
                    space.position.y,
                    space.position.z,
                ),
                size: Vec3::new(space.size.x - item_dims.x, item_dims.y, item_dims.z),
            },
            // Rest über dem Objekt, über die volle Grundfläche des Raums
            FreeSpace {
                position: Vec3::new(
                    space.position.x,
                    space.position.y + item_dims.y,
                    space.position.z,
                ),
                size: Vec3::new(space.size.x, space.size.y - item_dims.y, space.size.z),
            },
            // Rest entlang Z, über die volle Höhe des Raums
            FreeSpace {
                position: Vec3::new(
                    space.position.x,
                    space.position.y,
                    space.position.z + item_dims.z,
                ),
                size: Vec3::new(space.size.x, space.size.y, space.size.z - item_dims.z),
            },
        ];

        for successor in successors {
            if successor.size.x > self.epsilon
                && successor.size.y > self.epsilon
                && successor.size.z > self.epsilon
            {
                self.spaces.push(successor);
            }
        }

        self.merge();
    }

    /// Verschmilzt benachbarte Räume bis zum Fixpunkt.
    ///
    /// Zwei Räume werden vereinigt, wenn sie auf zwei Achsen identische
    /// Position und Ausdehnung haben und sich auf der dritten Achse
    /// aneinanderreihen.
    fn merge(&mut self) {
        let mut merged = true;

        while merged {
            merged = false;
            'outer: for i in 0..self.spaces.len() {
                for j in (i + 1)..self.spaces.len() {
                    if self.try_merge(i, j) {
                        merged = true;
                        break 'outer;
                    }
                }
            }
        }
    }

    /// Versucht, zwei Räume entlang einer Achse zu verschmelzen.
    ///
    /// # Rückgabewert
    /// `true`, wenn Raum `j` in Raum `i` aufgegangen ist
    fn try_merge(&mut self, i: usize, j: usize) -> bool {
        let eps = self.epsilon;
        let a = self.spaces[i];
        let b = self.spaces[j];

        for axis in 0..3 {
            let other1 = (axis + 1) % 3;
            let other2 = (axis + 2) % 3;

            let same_cross_section = (a.position[other1] - b.position[other1]).abs() < eps
                && (a.position[other2] - b.position[other2]).abs() < eps
                && (a.size[other1] - b.size[other1]).abs() < eps
                && (a.size[other2] - b.size[other2]).abs() < eps;
            if !same_cross_section {
                continue;
            }

            if (a.position[axis] + a.size[axis] - b.position[axis]).abs() < eps {
                // b schließt direkt an a an
                self.spaces[i].size[axis] += b.size[axis];
                self.spaces.remove(j);
                return true;
            }
            if (b.position[axis] + b.size[axis] - a.position[axis]).abs() < eps {
                // a schließt direkt an b an
                self.spaces[i].position[axis] = b.position[axis];
                self.spaces[i].size[axis] += b.size[axis];
                self.spaces.remove(j);
                return true;
            }
        }

        false
    }
}
