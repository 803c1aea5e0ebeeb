use crate::types::TestCase;

/// Discrete-adjoint cases of the parallel regression suite, in run order.
///
/// Value-checked cases come first; the file-diff cases follow them, matching
/// the order in which the suite has always reported them.
pub fn discrete_adjoint_suite() -> Vec<TestCase> {
    let mut cases = Vec::new();

    // Disc. adj. compressible Euler
    cases.push(TestCase::values(
        "discadj_naca0012",
        "cont_adj_euler/naca0012",
        "inv_NACA0012_discadj.cfg",
        100,
        &[-3.606841, -9.035214, -0.000000, 0.005688],
    ));
    cases.push(TestCase::values(
        "discadj_cylinder3D",
        "disc_adj_euler/cylinder3D",
        "inv_cylinder3D.cfg",
        5,
        &[-3.719306, -4.038129, 0.000000, 0.000000],
    ));
    cases.push(
        TestCase::values(
            "discadj_arina2k",
            "disc_adj_euler/arina2k",
            "Arina2KRS.cfg",
            20,
            &[-0.747330, -0.782632, 326.910000, 0.000000],
        )
        .with_timeout(8400),
    );

    // Disc. adj. compressible RANS
    cases.push(TestCase::values(
        "discadj_rans_naca0012_sa",
        "disc_adj_rans/naca0012",
        "turb_NACA0012_sa.cfg",
        10,
        &[-1.751966, 0.485697, 0.183154, -0.000018],
    ));
    cases.push(TestCase::values(
        "discadj_rans_naca0012_sst",
        "disc_adj_rans/naca0012",
        "turb_NACA0012_sst.cfg",
        10,
        &[-1.654042, -0.500944, 0.154703, -0.000022],
    ));

    // Disc. adj. incompressible Euler
    cases.push(TestCase::values(
        "discadj_incomp_NACA0012",
        "disc_adj_incomp_euler/naca0012",
        "incomp_NACA0012_disc.cfg",
        20,
        &[20.000000, -3.595580, -2.549720, 0.000000],
    ));

    // Disc. adj. incompressible N-S
    cases.push(TestCase::values(
        "discadj_incomp_cylinder",
        "disc_adj_incomp_navierstokes/cylinder",
        "heated_cylinder.cfg",
        20,
        &[20.000000, -2.104640, -2.004547, 0.0000e+00],
    ));

    // Disc. adj. incompressible RANS
    cases.push(TestCase::values(
        "discadj_incomp_turb_NACA0012_sa",
        "disc_adj_incomp_rans/naca0012",
        "turb_naca0012_sa.cfg",
        10,
        &[10.000000, -3.846036, -1.031071, 0.000000],
    ));
    cases.push(TestCase::values(
        "discadj_incomp_turb_NACA0012_sst",
        "disc_adj_incomp_rans/naca0012",
        "turb_naca0012_sst.cfg",
        10,
        &[-3.845805, -2.415680, -8.430441, 0.000000],
    ));

    // Unsteady disc. adj. compressible RANS
    cases.push(
        TestCase::values(
            "unsteady_cylinder",
            "disc_adj_rans/cylinder",
            "cylinder.cfg",
            9,
            &[3.746900, -1.544893, -8.3447e-03, 1.3808e-05],
        )
        .unsteady(),
    );
    // Dual time stepping, 1st order
    cases.push(
        TestCase::values(
            "unsteady_cylinder_DT_1ST",
            "disc_adj_rans/cylinder_DT_1ST",
            "cylinder.cfg",
            9,
            &[3.698165, -1.607052, -2.2503e-03, 2.7212e-05],
        )
        .unsteady(),
    );

    // Disc. adj. turbomachinery
    cases.push(TestCase::values(
        "transonic_stator",
        "disc_adj_turbomachinery/transonic_stator_2D",
        "transonic_stator.cfg",
        79,
        &[79.000000, -1.923936, -2.119783],
    ));

    // Structural adjoint
    cases.push(TestCase::values(
        "discadj_fea",
        "disc_adj_fea",
        "configAD_fem.cfg",
        9,
        &[-5.394766, -5.572142, -0.000364, -8.708681],
    ));

    // Disc. adj. heat
    cases.push(TestCase::values(
        "discadj_heat",
        "disc_adj_heat",
        "disc_adj_heat.cfg",
        10,
        &[3.183906, 0.923840, -223.200000, -2059.800000],
    ));

    // Coupled FSI adjoint
    cases.push(
        TestCase::values(
            "discadj_fsi",
            "disc_adj_fsi",
            "configAD_fsi.cfg",
            3000,
            &[0.958848, -0.157183, 0.658415, 1.302076],
        )
        .disabled(),
    );

    // Coupled CHT adjoint
    cases.push(TestCase::values(
        "discadj_cht",
        "coupled_cht/disc_adj_incomp_2d",
        "cht_2d_3cylinders.cfg",
        10,
        &[-2.406699, -3.097572, -3.097543, -3.095282],
    ));

    // Structural adjoint, topology optimization
    cases.push(TestCase::file_diff(
        "discadj_topol_optim",
        "fea_topology",
        "config.cfg",
        "grad_ref_node.dat.ref",
        "grad_ref_node.dat",
    ));

    // Coupled FSI adjoint, airfoil
    cases.push(
        TestCase::file_diff(
            "discadj_fsi_airfoil",
            "disc_adj_fsi/Airfoil_2d",
            "config.cfg",
            "grad_young.opt.ref",
            "grad_young.opt",
        )
        .disabled(),
    );

    cases
}
