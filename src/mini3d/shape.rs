//! Triangle meshes
//!
//! `Mesh` owns its data and is validated when built. `Shape` is the borrowed
//! view the scene draws: points, 0-based triangle indices, and the bounding
//! box center/extent.

use thiserror::Error;

use crate::math3d::Vec3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("face {face} references vertex {index}, mesh has {count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: usize,
        count: usize,
    },
    #[error("index buffer length {0} is not a multiple of 3")]
    RaggedIndices(usize),
    #[error("face {face} uses index 0 in a 1-based index buffer")]
    ZeroIndex { face: usize },
}

fn validate(points: &[Vec3], faces: &[[usize; 3]]) -> Result<(), MeshError> {
    for (face, tri) in faces.iter().enumerate() {
        if let Some(&index) = tri.iter().find(|&&i| i >= points.len()) {
            return Err(MeshError::IndexOutOfRange {
                face,
                index,
                count: points.len(),
            });
        }
    }
    Ok(())
}

/// Borrowed mesh ready for drawing
#[derive(Debug, Clone, Copy)]
pub struct Shape<'a> {
    points: &'a [Vec3],
    faces: &'a [[usize; 3]],
    center: Vec3,
    extent: Vec3,
}

impl<'a> Shape<'a> {
    /// Wrap caller-owned points and faces. Every index must be in range.
    pub fn new(points: &'a [Vec3], faces: &'a [[usize; 3]]) -> Result<Self, MeshError> {
        validate(points, faces)?;
        Ok(Self::new_unchecked(points, faces))
    }

    fn new_unchecked(points: &'a [Vec3], faces: &'a [[usize; 3]]) -> Self {
        let (center, extent) = match points.split_first() {
            None => (Vec3::ZERO, Vec3::ZERO),
            Some((first, rest)) => {
                let (min, max) = rest.iter().fold((*first, *first), |(lo, hi), p| {
                    (
                        Vec3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                        Vec3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
                    )
                });
                ((min + max) * 0.5, (max - min) * 0.5)
            },
        };
        Self {
            points,
            faces,
            center,
            extent,
        }
    }

    #[inline]
    pub fn points(&self) -> &'a [Vec3] {
        self.points
    }

    #[inline]
    pub fn faces(&self) -> &'a [[usize; 3]] {
        self.faces
    }

    /// Midpoint of the bounding box
    #[inline]
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Half-size of the bounding box
    #[inline]
    pub fn extent(&self) -> Vec3 {
        self.extent
    }
}

/// Owned triangle mesh with 0-based indices
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    points: Vec<Vec3>,
    faces: Vec<[usize; 3]>,
}

impl Mesh {
    pub fn new(points: Vec<Vec3>, faces: Vec<[usize; 3]>) -> Result<Self, MeshError> {
        validate(&points, &faces)?;
        Ok(Self { points, faces })
    }

    /// Build from a flat 1-based index buffer (three indices per triangle)
    pub fn from_one_based(points: Vec<Vec3>, indices: &[u16]) -> Result<Self, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::RaggedIndices(indices.len()));
        }
        let faces = indices
            .chunks_exact(3)
            .enumerate()
            .map(|(face, tri)| {
                if tri.contains(&0) {
                    return Err(MeshError::ZeroIndex { face });
                }
                Ok([
                    tri[0] as usize - 1,
                    tri[1] as usize - 1,
                    tri[2] as usize - 1,
                ])
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(points, faces)
    }

    /// Axis-aligned cube centered at the origin, outward-facing
    /// counter-clockwise triangles
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let points = vec![
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
        ];
        let faces = vec![
            // +z
            [4, 5, 6],
            [4, 6, 7],
            // -z
            [1, 0, 3],
            [1, 3, 2],
            // -x
            [0, 4, 7],
            [0, 7, 3],
            // +x
            [5, 1, 2],
            [5, 2, 6],
            // +y
            [7, 6, 2],
            [7, 2, 3],
            // -y
            [0, 1, 5],
            [0, 5, 4],
        ];
        Self { points, faces }
    }

    /// Regular icosahedron on a sphere of `radius`
    pub fn icosahedron(radius: f32) -> Self {
        let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let points = [
            (-1.0, t, 0.0),
            (1.0, t, 0.0),
            (-1.0, -t, 0.0),
            (1.0, -t, 0.0),
            (0.0, -1.0, t),
            (0.0, 1.0, t),
            (0.0, -1.0, -t),
            (0.0, 1.0, -t),
            (t, 0.0, -1.0),
            (t, 0.0, 1.0),
            (-t, 0.0, -1.0),
            (-t, 0.0, 1.0),
        ]
        .iter()
        .map(|&(x, y, z)| Vec3::new(x, y, z).normalize() * radius)
        .collect();

        let faces = vec![
            [0, 11, 5],
            [0, 5, 1],
            [0, 1, 7],
            [0, 7, 10],
            [0, 10, 11],
            [1, 5, 9],
            [5, 11, 4],
            [11, 10, 2],
            [10, 7, 6],
            [7, 1, 8],
            [3, 9, 4],
            [3, 4, 2],
            [3, 2, 6],
            [3, 6, 8],
            [3, 8, 9],
            [4, 9, 5],
            [2, 4, 11],
            [6, 2, 10],
            [8, 6, 7],
            [9, 8, 1],
        ];
        Self { points, faces }
    }

    /// Small winged plane: fuselage, cockpit, wings and tail
    pub fn plane_ship() -> Self {
        let points = PLANE_POINTS
            .iter()
            .map(|&[x, y, z]| Vec3::new(x, y, z))
            .collect();
        Self {
            points,
            faces: PLANE_FACES.to_vec(),
        }
    }

    /// Borrowed view for drawing
    pub fn shape(&self) -> Shape<'_> {
        Shape::new_unchecked(&self.points, &self.faces)
    }
}

const PLANE_POINTS: [[f32; 3]; 28] = [
    [1.000000, -1.000000, 1.000000],
    [-1.000000, -1.000000, -1.000000],
    [-0.754643, 0.700373, 1.000000],
    [-0.654210, -0.654210, 2.619101],
    [-0.480073, 0.111070, 2.879520],
    [0.480073, 0.111070, 2.879520],
    [0.654210, -0.654210, 2.619101],
    [-1.000000, -1.000000, 1.000000],
    [0.754643, 0.408254, -1.529500],
    [1.000000, -1.000000, -1.000000],
    [0.754643, 0.700373, 1.000000],
    [-0.754643, 0.408254, -1.529500],
    [-1.283430, -0.567080, -1.000000],
    [-1.283430, -0.567080, 1.000000],
    [1.283430, 0.050230, -1.000000],
    [1.283430, -0.567080, -1.000000],
    [-1.283430, 0.050230, 1.000000],
    [1.283430, 0.050230, 1.000000],
    [1.283430, -0.567080, 1.000000],
    [-1.283430, 0.050230, -1.000000],
    [-3.291110, -0.774914, -1.192131],
    [-3.291110, -0.774914, -0.118306],
    [3.291110, -0.447044, -1.192131],
    [3.291110, -0.774914, -1.192131],
    [-3.291110, -0.447044, -0.118306],
    [3.291110, -0.447044, -0.118306],
    [3.291110, -0.774914, -0.118306],
    [-3.291110, -0.447044, -1.192131],
];

const PLANE_FACES: [[usize; 3]; 52] = [
    [8, 11, 2],
    [8, 2, 10],
    [1, 9, 0],
    [1, 0, 7],
    [1, 11, 8],
    [1, 8, 9],
    [6, 5, 4],
    [6, 4, 3],
    [2, 16, 13],
    [2, 13, 4],
    [7, 0, 6],
    [7, 6, 3],
    [10, 2, 4],
    [10, 4, 5],
    [2, 11, 19],
    [2, 19, 16],
    [9, 8, 14],
    [9, 14, 15],
    [4, 13, 7],
    [4, 7, 3],
    [14, 17, 25],
    [14, 25, 22],
    [18, 15, 23],
    [18, 23, 26],
    [11, 1, 12],
    [11, 12, 19],
    [0, 18, 5],
    [0, 5, 6],
    [1, 7, 13],
    [1, 13, 12],
    [0, 9, 15],
    [0, 15, 18],
    [8, 10, 17],
    [8, 17, 14],
    [18, 17, 10],
    [18, 10, 5],
    [21, 24, 27],
    [21, 27, 20],
    [23, 22, 25],
    [23, 25, 26],
    [17, 18, 26],
    [17, 26, 25],
    [15, 14, 22],
    [15, 22, 23],
    [16, 19, 27],
    [16, 27, 24],
    [19, 12, 20],
    [19, 20, 27],
    [13, 16, 24],
    [13, 24, 21],
    [12, 13, 21],
    [12, 21, 20],
];
