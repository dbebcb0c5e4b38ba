//! Packlogik für die 3D-Beladung eines Laderaums.
//!
//! Dieses Modul implementiert den heuristischen Algorithmus zur Anordnung
//! von Objekten in einem Laderaum:
//! - Objekte werden nach Volumen absteigend verarbeitet (große zuerst)
//! - je Objekt werden alle 6 Orientierungen gegen alle Freiräume geprüft,
//!   stabile Positionen (Boden oder Auflage) zuerst
//! - nach der Platzierung senkt ein Schwerkraft-Durchlauf jedes Objekt so
//!   weit ab, wie es die Kollisionsprüfung erlaubt
//! - eine begrenzte Korrekturphase trennt verbliebene Restüberlappungen
//!   entlang der Achse der geringsten Eindringtiefe
//!
//! Das Gewicht der Objekte wird hier bewusst nicht geprüft: die Beladung
//! ist rein geometrisch, die Gewichtsbilanz meldet die aufrufende Schicht.

use std::cmp::Ordering;

use serde::Serialize;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::geometry::{
    boxes_overlap, boxes_overlap_tight, clearance_for, intervals_overlap, min_separation,
};
use crate::model::{CargoHold, CargoItem, PlacedItem, Shape};
use crate::spaces::SpaceTracker;
use crate::types::{EPSILON_GENERAL, EPSILON_SPACE, Vec3};

/// Konfiguration für den Packing-Algorithmus.
///
/// Enthält alle Toleranzen und Grenzwerte zur Steuerung des Verhaltens.
/// Die Voreinstellungen gehen von Zentimetern als Längeneinheit aus.
#[derive(Copy, Clone, Debug)]
pub struct PackerConfig {
    /// Toleranz der Freiraumverwaltung (degenerierte Räume, Nachbarschaft,
    /// Boden- und Auflagenvergleich)
    pub space_epsilon: f64,
    /// Schrittweite der Schwerkraft-Absenkung
    pub gravity_step: f64,
    /// Horizontaler Sicherheitsabstand, sobald ein Zylinder beteiligt ist
    pub cylinder_clearance: f64,
    /// Allseitiger Sicherheitsabstand, sobald eine Kugel beteiligt ist
    pub sphere_clearance: f64,
    /// Marge, um die der Korrektur-Überlappungstest enger ist als der
    /// Platzierungstest
    pub resolve_margin: f64,
    /// Zusätzlicher Abstand beim Auseinanderschieben überlappender Objekte
    pub separation_margin: f64,
    /// Maximale Anzahl an Korrekturrunden
    pub max_correction_rounds: usize,
}

impl PackerConfig {
    pub const DEFAULT_SPACE_EPSILON: f64 = EPSILON_SPACE;
    pub const DEFAULT_GRAVITY_STEP: f64 = 0.5;
    pub const DEFAULT_CYLINDER_CLEARANCE: f64 = 1.0;
    pub const DEFAULT_SPHERE_CLEARANCE: f64 = 0.5;
    pub const DEFAULT_RESOLVE_MARGIN: f64 = 0.02;
    pub const DEFAULT_SEPARATION_MARGIN: f64 = 0.2;
    pub const DEFAULT_MAX_CORRECTION_ROUNDS: usize = 20;

    /// Erstellt einen Builder für benutzerdefinierte Konfiguration.
    pub fn builder() -> PackerConfigBuilder {
        PackerConfigBuilder::default()
    }
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            space_epsilon: Self::DEFAULT_SPACE_EPSILON,
            gravity_step: Self::DEFAULT_GRAVITY_STEP,
            cylinder_clearance: Self::DEFAULT_CYLINDER_CLEARANCE,
            sphere_clearance: Self::DEFAULT_SPHERE_CLEARANCE,
            resolve_margin: Self::DEFAULT_RESOLVE_MARGIN,
            separation_margin: Self::DEFAULT_SEPARATION_MARGIN,
            max_correction_rounds: Self::DEFAULT_MAX_CORRECTION_ROUNDS,
        }
    }
}

/// Builder für PackerConfig.
#[derive(Clone, Debug, Default)]
pub struct PackerConfigBuilder {
    config: PackerConfig,
}

impl PackerConfigBuilder {
    /// Setzt die Toleranz der Freiraumverwaltung.
    pub fn space_epsilon(mut self, epsilon: f64) -> Self {
        self.config.space_epsilon = epsilon;
        self
    }

    /// Setzt die Schrittweite der Schwerkraft-Absenkung.
    pub fn gravity_step(mut self, step: f64) -> Self {
        self.config.gravity_step = step;
        self
    }

    /// Setzt den Zylinder-Sicherheitsabstand.
    pub fn cylinder_clearance(mut self, clearance: f64) -> Self {
        self.config.cylinder_clearance = clearance;
        self
    }

    /// Setzt den Kugel-Sicherheitsabstand.
    pub fn sphere_clearance(mut self, clearance: f64) -> Self {
        self.config.sphere_clearance = clearance;
        self
    }

    /// Setzt die Marge des Korrektur-Überlappungstests.
    pub fn resolve_margin(mut self, margin: f64) -> Self {
        self.config.resolve_margin = margin;
        self
    }

    /// Setzt den Abstand beim Auseinanderschieben.
    pub fn separation_margin(mut self, margin: f64) -> Self {
        self.config.separation_margin = margin;
        self
    }

    /// Setzt die maximale Anzahl an Korrekturrunden.
    pub fn max_correction_rounds(mut self, rounds: usize) -> Self {
        self.config.max_correction_rounds = rounds;
        self
    }

    /// Erstellt die finale Konfiguration.
    pub fn build(self) -> PackerConfig {
        self.config
    }
}

/// Gründe, warum ein Objekt nicht platziert werden konnte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnplacedReason {
    DimensionsExceedHold,
    NoFreeSpace,
    PlacementCollision,
}

impl UnplacedReason {
    pub fn code(&self) -> &'static str {
        match self {
            UnplacedReason::DimensionsExceedHold => "dimensions_exceed_hold",
            UnplacedReason::NoFreeSpace => "no_free_space",
            UnplacedReason::PlacementCollision => "placement_collision",
        }
    }
}

impl std::fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnplacedReason::DimensionsExceedHold => {
                write!(
                    f,
                    "Objekt passt in keiner Orientierung in den Laderaum"
                )
            }
            UnplacedReason::NoFreeSpace => {
                write!(f, "Kein ausreichend großer Freiraum mehr verfügbar")
            }
            UnplacedReason::PlacementCollision => {
                write!(
                    f,
                    "Kollisionsprüfung hat die gefundene Position verworfen"
                )
            }
        }
    }
}

/// Objekt, das nicht platziert werden konnte.
#[derive(Clone, Debug)]
pub struct UnplacedItem {
    pub item: CargoItem,
    pub reason: UnplacedReason,
}

/// Ergebnis eines Packlaufs.
///
/// Die Platzierungen sind eine Teilmenge der Eingabe; nicht unterbringbare
/// Objekte stehen mit Begründung in `unplaced`.
#[derive(Clone, Debug, Default)]
pub struct PackOutcome {
    pub placements: Vec<PlacedItem>,
    pub unplaced: Vec<UnplacedItem>,
}

impl PackOutcome {
    /// Gibt an, ob alle Objekte untergebracht wurden.
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }

    /// Anzahl der platzierten Objekte.
    pub fn placed_count(&self) -> usize {
        self.placements.len()
    }

    /// Anzahl der nicht platzierten Objekte.
    pub fn unplaced_count(&self) -> usize {
        self.unplaced.len()
    }

    /// Gesamtgewicht der platzierten Objekte.
    pub fn placed_weight(&self) -> f64 {
        self.placements.iter().map(|p| p.item.weight).sum()
    }

    /// Summe der Bounding-Box-Volumina der platzierten Objekte.
    pub fn placed_volume(&self) -> f64 {
        self.placements.iter().map(|p| p.item.volume()).sum()
    }
}

/// Ereignisse während des Packens, für Live-Visualisierung per SSE.
///
/// `ItemPlaced` meldet die vorläufige Position aus der Platzierungssuche;
/// Absenkung und Korrektur können sie noch verschieben. Die endgültigen
/// Positionen stehen erst mit `Finished` fest.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// Ein Packlauf beginnt.
    Started {
        item_count: usize,
        #[schema(value_type = [f64; 3], example = json!([180.0, 180.0, 300.0]))]
        hold_dims: (f64, f64, f64),
    },
    /// Ein Objekt wurde (vorläufig) platziert.
    ItemPlaced {
        id: usize,
        #[schema(value_type = [f64; 3], example = json!([-125.0, -65.0, -65.0]))]
        position: (f64, f64, f64),
        rotation: usize,
        #[schema(value_type = [f64; 3], example = json!([50.0, 50.0, 50.0]))]
        dims: (f64, f64, f64),
    },
    /// Ein Objekt konnte nicht platziert werden.
    ItemRejected {
        id: usize,
        reason_code: String,
        reason_text: String,
    },
    /// Packen abgeschlossen.
    Finished { placed: usize, unplaced: usize },
}

/// Suchzustand eines Packlaufs.
///
/// Wird explizit durch die Phasen gereicht, damit Freiraumverwaltung,
/// Platzierungssuche und Nachbearbeitung unabhängig testbar bleiben.
struct PackerState {
    spaces: SpaceTracker,
    placed: Vec<PlacedItem>,
    floor_y: f64,
}

impl PackerState {
    fn new(hold: &CargoHold, config: &PackerConfig) -> Self {
        Self {
            spaces: SpaceTracker::seed(hold, config.space_epsilon),
            placed: Vec::new(),
            floor_y: hold.floor_y(),
        }
    }
}

/// Platzierungskandidat der Suchphase.
#[derive(Clone, Copy)]
struct Candidate {
    space_index: usize,
    corner: Vec3,
    dims: Vec3,
    rotation: usize,
    score: f64,
}

/// Kompakte Beschreibung einer gelungenen Platzierung, für Ereignisse.
struct PlacedSnapshot {
    id: usize,
    position: Vec3,
    rotation: usize,
    dims: Vec3,
}

/// Packt Objekte mit Standardkonfiguration und liefert nur die Platzierungen.
///
/// Nicht unterbringbare Objekte fehlen stillschweigend im Ergebnis; wer
/// wissen will, ob alles passt, vergleicht die Längen oder verwendet
/// [`pack_with_config`].
///
/// # Parameter
/// * `items` - Liste der zu ladenden Objekte
/// * `hold` - Der Laderaum
///
/// # Rückgabewert
/// Platzierungen (Mittelpunkt + Orientierungsindex), höchstens eine je Objekt
pub fn pack(items: Vec<CargoItem>, hold: &CargoHold) -> Vec<PlacedItem> {
    pack_with_config(items, hold, PackerConfig::default()).placements
}

/// Packt Objekte mit benutzerdefinierter Konfiguration.
pub fn pack_with_config(
    items: Vec<CargoItem>,
    hold: &CargoHold,
    config: PackerConfig,
) -> PackOutcome {
    pack_with_progress(items, hold, config, |_| {})
}

/// Packt Objekte und meldet jeden Schritt über ein Callback.
///
/// Geeignet für SSE/WebSocket-Streaming an eine Visualisierung.
///
/// # Parameter
/// * `items` - Liste der zu ladenden Objekte
/// * `hold` - Der Laderaum
/// * `config` - Konfigurationsparameter
/// * `on_event` - Callback für jedes [`PackEvent`]
pub fn pack_with_progress(
    items: Vec<CargoItem>,
    hold: &CargoHold,
    config: PackerConfig,
    mut on_event: impl FnMut(&PackEvent),
) -> PackOutcome {
    on_event(&PackEvent::Started {
        item_count: items.len(),
        hold_dims: (hold.width, hold.height, hold.depth),
    });

    if items.is_empty() {
        on_event(&PackEvent::Finished {
            placed: 0,
            unplaced: 0,
        });
        return PackOutcome::default();
    }

    // Sortierung: große Objekte zuerst, bei gleichem Volumen nach ID.
    // Die feste Reihenfolge macht den Lauf deterministisch.
    let mut items = items;
    items.sort_by(|a, b| {
        b.volume()
            .partial_cmp(&a.volume())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut state = PackerState::new(hold, &config);
    let mut unplaced: Vec<UnplacedItem> = Vec::new();

    for item in items {
        match place_item(&mut state, hold, item, &config) {
            Ok(snapshot) => {
                on_event(&PackEvent::ItemPlaced {
                    id: snapshot.id,
                    position: snapshot.position.as_tuple(),
                    rotation: snapshot.rotation,
                    dims: snapshot.dims.as_tuple(),
                });
            }
            Err(entry) => {
                on_event(&PackEvent::ItemRejected {
                    id: entry.item.id,
                    reason_code: entry.reason.code().to_string(),
                    reason_text: entry.reason.to_string(),
                });
                unplaced.push(entry);
            }
        }
    }

    settle_gravity(&mut state, &config);
    resolve_overlaps(&mut state, &config);

    on_event(&PackEvent::Finished {
        placed: state.placed.len(),
        unplaced: unplaced.len(),
    });

    PackOutcome {
        placements: state.placed,
        unplaced,
    }
}

/// Platziert ein einzelnes Objekt im besten verfügbaren Freiraum.
///
/// Durchlauf 1 betrachtet nur stabile Positionen (Boden oder Auflage auf
/// einem platzierten Objekt), bewertet mit `x² + z² + 10·y`. Findet sich
/// keine, lässt Durchlauf 2 die Stabilitätsbedingung fallen und bewertet
/// mit dem reinen Abstand zum Ursprung. Unmittelbar vor der Übernahme wird
/// die Position nochmals gegen alle platzierten Objekte geprüft.
fn place_item(
    state: &mut PackerState,
    hold: &CargoHold,
    item: CargoItem,
    config: &PackerConfig,
) -> Result<PlacedSnapshot, UnplacedItem> {
    let orientations: [Vec3; 6] = std::array::from_fn(|r| item.rotated_dims(r));

    let mut best: Option<Candidate> = None;

    // Durchlauf 1: nur stabile Positionen
    for (space_index, space) in state.spaces.spaces().iter().enumerate() {
        for (rotation, &dims) in orientations.iter().enumerate() {
            if !space.can_hold(dims) {
                continue;
            }

            let on_floor = (space.position.y - state.floor_y).abs() < config.space_epsilon;
            if !on_floor
                && !is_supported(&state.placed, space.position, dims, config.space_epsilon)
            {
                continue;
            }

            let score = space.position.x.powi(2)
                + space.position.z.powi(2)
                + 10.0 * space.position.y;
            if best.is_none_or(|b| score < b.score) {
                best = Some(Candidate {
                    space_index,
                    corner: space.position,
                    dims,
                    rotation,
                    score,
                });
            }
        }
    }

    // Durchlauf 2: beliebige gültige Position
    if best.is_none() {
        for (space_index, space) in state.spaces.spaces().iter().enumerate() {
            for (rotation, &dims) in orientations.iter().enumerate() {
                if !space.can_hold(dims) {
                    continue;
                }

                let score = space.position.x.powi(2)
                    + space.position.y.powi(2)
                    + space.position.z.powi(2);
                if best.is_none_or(|b| score < b.score) {
                    best = Some(Candidate {
                        space_index,
                        corner: space.position,
                        dims,
                        rotation,
                        score,
                    });
                }
            }
        }
    }

    let Some(candidate) = best else {
        let fits_somehow = orientations
            .iter()
            .any(|dims| dims.fits_within(&hold.frame_size(), EPSILON_GENERAL));
        let reason = if fits_somehow {
            UnplacedReason::NoFreeSpace
        } else {
            UnplacedReason::DimensionsExceedHold
        };
        return Err(UnplacedItem { item, reason });
    };

    let position = candidate.corner + candidate.dims.half();

    if would_collide(&state.placed, position, candidate.dims, item.shape, config) {
        return Err(UnplacedItem {
            item,
            reason: UnplacedReason::PlacementCollision,
        });
    }

    let snapshot = PlacedSnapshot {
        id: item.id,
        position,
        rotation: candidate.rotation,
        dims: candidate.dims,
    };
    state
        .placed
        .push(PlacedItem::new(item, position, candidate.rotation));
    state.spaces.consume(candidate.space_index, candidate.dims);

    Ok(snapshot)
}

/// Prüft, ob eine Kandidatenposition auf einem platzierten Objekt aufliegt.
///
/// Auflage liegt vor, wenn die Oberseite eines platzierten Objekts auf
/// Höhe der Unterkante des Kandidaten liegt und sich die Grundflächen
/// überschneiden.
///
/// # Parameter
/// * `placed` - bereits platzierte Objekte
/// * `corner` - Minimal-Ecke der Kandidatenposition
/// * `dims` - orientierte Ausdehnung des Kandidaten
/// * `epsilon` - Toleranz für den Höhenvergleich
fn is_supported(placed: &[PlacedItem], corner: Vec3, dims: Vec3, epsilon: f64) -> bool {
    for p in placed {
        let p_dims = p.dims();
        let top = p.position.y + p_dims.y / 2.0;
        if (top - corner.y).abs() >= epsilon {
            continue;
        }

        let overlap_x = intervals_overlap(
            corner.x,
            corner.x + dims.x,
            p.position.x - p_dims.x / 2.0,
            p.position.x + p_dims.x / 2.0,
        );
        let overlap_z = intervals_overlap(
            corner.z,
            corner.z + dims.z,
            p.position.z - p_dims.z / 2.0,
            p.position.z + p_dims.z / 2.0,
        );

        if overlap_x && overlap_z {
            return true;
        }
    }

    false
}

/// Prüft eine Kandidatenposition gegen alle platzierten Objekte.
///
/// Verwendet die formabhängigen Sicherheitsabstände beider Objekte.
fn would_collide(
    placed: &[PlacedItem],
    position: Vec3,
    dims: Vec3,
    shape: Shape,
    config: &PackerConfig,
) -> bool {
    placed.iter().any(|p| {
        let buffer = clearance_for(
            shape,
            p.item.shape,
            config.cylinder_clearance,
            config.sphere_clearance,
        );
        boxes_overlap(position, dims, p.position, p.dims(), buffer)
    })
}

/// Senkt alle platzierten Objekte ab, bis sie aufliegen.
///
/// Wiederholt volle Durchläufe über alle Objekte: jedes Objekt wird in
/// festen Schritten abgesenkt, bis der nächste Schritt den Boden
/// durchstoßen oder ein anderes Objekt treffen würde; beim Boden wird exakt
/// eingerastet. Sinkt in einem Durchlauf noch irgendein Objekt, folgt ein
/// weiterer, weil tiefer liegende Objekte ihren Nachbarn neuen Platz
/// freigeben können. Fixpunkt erreicht = fertig.
fn settle_gravity(state: &mut PackerState, config: &PackerConfig) {
    let mut changed = true;

    while changed {
        changed = false;

        for i in 0..state.placed.len() {
            let dims = state.placed[i].dims();
            let shape = state.placed[i].item.shape;
            let start = state.placed[i].position;

            // Momentaufnahme der übrigen Objekte samt Pufferzonen
            let others: Vec<(Vec3, Vec3, Vec3)> = state
                .placed
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, p)| {
                    let buffer = clearance_for(
                        shape,
                        p.item.shape,
                        config.cylinder_clearance,
                        config.sphere_clearance,
                    );
                    (p.position, p.dims(), buffer)
                })
                .collect();

            let mut y = start.y;
            loop {
                let test_y = y - config.gravity_step;

                if test_y - dims.y / 2.0 <= state.floor_y {
                    y = state.floor_y + dims.y / 2.0;
                    break;
                }

                let test_pos = Vec3::new(start.x, test_y, start.z);
                let collides = others
                    .iter()
                    .any(|(pos, other_dims, buffer)| {
                        boxes_overlap(test_pos, dims, *pos, *other_dims, *buffer)
                    });
                if collides {
                    break;
                }

                y = test_y;
            }

            if y < start.y {
                state.placed[i].position.y = y;
                changed = true;
            }
        }
    }
}

/// Trennt verbliebene Überlappungen nach der Absenkung.
///
/// Je Runde wird jedes Objektpaar mit dem engeren Überlappungstest geprüft;
/// bei Überlappung wird das zweite Objekt entlang der Achse der geringsten
/// Eindringtiefe um Eindringtiefe plus Marge weggeschoben. Die Rundenzahl
/// ist begrenzt; nach Erreichen des Limits bleibt das bisherige Ergebnis
/// bestehen. Eine Verschiebung kann die Auflage eines Objekts aufheben;
/// die Überlappungsfreiheit hat hier Vorrang vor der physikalischen
/// Plausibilität.
fn resolve_overlaps(state: &mut PackerState, config: &PackerConfig) {
    for _ in 0..config.max_correction_rounds {
        let mut found_overlap = false;

        for i in 0..state.placed.len() {
            for j in (i + 1)..state.placed.len() {
                let pos_a = state.placed[i].position;
                let dims_a = state.placed[i].dims();
                let pos_b = state.placed[j].position;
                let dims_b = state.placed[j].dims();

                if !boxes_overlap_tight(pos_a, dims_a, pos_b, dims_b, config.resolve_margin) {
                    continue;
                }
                found_overlap = true;

                if let Some((axis, depth)) = min_separation(pos_a, dims_a, pos_b, dims_b) {
                    let direction = if pos_b[axis] >= pos_a[axis] { 1.0 } else { -1.0 };
                    state.placed[j].position[axis] +=
                        (depth + config.separation_margin) * direction;
                }
            }
        }

        if !found_overlap {
            break;
        }
    }
}
