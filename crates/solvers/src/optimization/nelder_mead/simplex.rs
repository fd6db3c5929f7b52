use super::{Config, InitialStep, Vertex};

/// Returns the comparable score of an objective value.
///
/// NaN objectives rank as the worst possible score.
pub(super) fn score<F: Fn(f64) -> f64>(transform: &F, objective: f64) -> f64 {
    let s = transform(objective);
    if s.is_nan() { f64::INFINITY } else { s }
}

/// Returns `base + t * (toward - base)`, coordinate by coordinate.
fn affine(base: &[f64], toward: &[f64], t: f64) -> Vec<f64> {
    base.iter()
        .zip(toward)
        .map(|(b, w)| b + t * (w - b))
        .collect()
}

/// The `N + 1` vertices of the search, ordered from best to worst score.
#[derive(Debug, Clone)]
pub(super) struct Simplex {
    vertices: Vec<Vertex>,
}

impl Simplex {
    /// Builds the initial simplex points around `initial`.
    ///
    /// The first point is `initial` itself; point `i + 1` perturbs coordinate `i`.
    pub(super) fn initial_points(initial: &[f64], step: InitialStep) -> Vec<Vec<f64>> {
        let mut points = Vec::with_capacity(initial.len() + 1);
        points.push(initial.to_vec());

        for i in 0..initial.len() {
            let mut point = initial.to_vec();
            point[i] = if point[i] == 0.0 {
                step.zero
            } else {
                (1.0 + step.relative) * point[i]
            };
            points.push(point);
        }

        points
    }

    /// Creates a simplex from evaluated vertices, ordering them by score.
    pub(super) fn new<F: Fn(f64) -> f64>(vertices: Vec<Vertex>, transform: &F) -> Self {
        let mut simplex = Self { vertices };
        simplex.sort(transform);
        simplex
    }

    /// Stable sort, so older vertices win ties.
    fn sort<F: Fn(f64) -> f64>(&mut self, transform: &F) {
        self.vertices.sort_by(|a, b| {
            score(transform, a.objective).total_cmp(&score(transform, b.objective))
        });
    }

    pub(super) fn best(&self) -> &Vertex {
        &self.vertices[0]
    }

    pub(super) fn worst(&self) -> &Vertex {
        &self.vertices[self.vertices.len() - 1]
    }

    /// The second-worst vertex; the best vertex for a one-dimensional simplex.
    pub(super) fn second_worst(&self) -> &Vertex {
        &self.vertices[self.vertices.len().saturating_sub(2)]
    }

    /// Centroid of every vertex except the worst.
    pub(super) fn centroid(&self) -> Vec<f64> {
        let keep = &self.vertices[..self.vertices.len() - 1];
        let n = keep.len() as f64;
        let mut centroid = vec![0.0; self.best().x.len()];
        for vertex in keep {
            for (c, x) in centroid.iter_mut().zip(&vertex.x) {
                *c += x;
            }
        }
        for c in &mut centroid {
            *c /= n;
        }
        centroid
    }

    /// Reflects the worst vertex through `centroid`.
    pub(super) fn reflect(&self, centroid: &[f64], reflection: f64) -> Vec<f64> {
        affine(centroid, &self.worst().x, -reflection)
    }

    /// Moves from `centroid` past the reflected point.
    pub(super) fn expand(centroid: &[f64], reflected: &[f64], expansion: f64) -> Vec<f64> {
        affine(centroid, reflected, expansion)
    }

    /// Moves from `centroid` partway toward the reflected point.
    pub(super) fn contract_outside(
        centroid: &[f64],
        reflected: &[f64],
        contraction: f64,
    ) -> Vec<f64> {
        affine(centroid, reflected, contraction)
    }

    /// Moves from `centroid` partway toward the worst vertex.
    pub(super) fn contract_inside(&self, centroid: &[f64], contraction: f64) -> Vec<f64> {
        affine(centroid, &self.worst().x, contraction)
    }

    /// Points for every vertex but the best, moved toward the best.
    pub(super) fn shrink_points(&self, shrink: f64) -> Vec<Vec<f64>> {
        let best = &self.best().x;
        self.vertices[1..]
            .iter()
            .map(|v| affine(best, &v.x, shrink))
            .collect()
    }

    pub(super) fn replace_worst<F: Fn(f64) -> f64>(&mut self, vertex: Vertex, transform: &F) {
        let last = self.vertices.len() - 1;
        self.vertices[last] = vertex;
        self.sort(transform);
    }

    /// Replaces every vertex but the best, as after a shrink.
    pub(super) fn replace_all_but_best<F: Fn(f64) -> f64>(
        &mut self,
        vertices: Vec<Vertex>,
        transform: &F,
    ) {
        self.vertices.truncate(1);
        self.vertices.extend(vertices);
        self.sort(transform);
    }

    /// Largest coordinate distance from any vertex to the best vertex.
    pub(super) fn x_spread(&self) -> f64 {
        let best = &self.best().x;
        self.vertices[1..]
            .iter()
            .flat_map(|v| v.x.iter().zip(best).map(|(x, b)| (x - b).abs()))
            .fold(0.0, f64::max)
    }

    /// Largest score distance from any vertex to the best vertex.
    ///
    /// Infinite when any score is non-finite.
    pub(super) fn f_spread<F: Fn(f64) -> f64>(&self, transform: &F) -> f64 {
        let best = score(transform, self.best().objective);
        self.vertices[1..]
            .iter()
            .map(|v| score(transform, v.objective))
            .map(|s| {
                if s.is_finite() && best.is_finite() {
                    (s - best).abs()
                } else {
                    f64::INFINITY
                }
            })
            .fold(0.0, f64::max)
    }

    pub(super) fn is_converged<F: Fn(f64) -> f64>(&self, config: &Config, transform: &F) -> bool {
        self.x_spread() <= config.x_abs_tol() && self.f_spread(transform) <= config.f_abs_tol()
    }
}
